use std::path::PathBuf;

use protocol::testing::ScriptedVm;
use replay::{RecordedLaunch, load_recording};
use tracer::{ThreadedLauncher, Tracer, TracerConfig};

fn recording(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("recordings")
        .join(name)
}

#[test]
fn replays_the_hello_recording() -> eyre::Result<()> {
    let recording = load_recording(recording("hello.json"))?;
    assert_eq!(recording.launch, Some(RecordedLaunch::Succeeded));

    let launch = recording.launch.unwrap_or(RecordedLaunch::Succeeded);
    let launcher = ThreadedLauncher::new(move |_| launch.into_result());
    let vm = ScriptedVm::from_script(recording.script);
    let mut tracer = Tracer::with_defaults(vm, TracerConfig::default(), "class Main {}", launcher)?;

    let mut out = Vec::new();
    let document = tracer.run(&mut out)?;

    let events: Vec<_> = document.records().iter().filter_map(|r| r.event()).collect();
    assert_eq!(events, ["call", "step_line", "return"]);
    assert_eq!(
        document.records()[0].get("globals").unwrap()["Main.greeting"],
        "\"hello\""
    );

    let written: serde_json::Value = serde_json::from_slice(&out)?;
    assert_eq!(written["code"], "class Main {}");
    Ok(())
}
