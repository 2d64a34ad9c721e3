use std::io::Write;

use eyre::WrapErr;

use crate::{
    convert::Converter,
    types::{LaunchResult, OutputDocument, TraceRecord},
};

/// Append-only record sequence and final document assembly.
#[derive(Debug, Default)]
pub struct TraceAssembler {
    records: Vec<TraceRecord>,
}

impl TraceAssembler {
    pub(crate) fn push(&mut self, record: TraceRecord) {
        self.records.push(record);
    }

    pub fn records(&self) -> &[TraceRecord] {
        &self.records
    }

    /// Build the run's single document. A failed launch wins over any
    /// collected records.
    pub(crate) fn finish<C: Converter>(
        self,
        code: &str,
        launch: Option<LaunchResult>,
        converter: &C,
    ) -> OutputDocument {
        match launch.as_ref().and_then(LaunchResult::failure) {
            Some(failure) => {
                tracing::debug!(
                    discarded = self.records.len(),
                    message = %failure.message,
                    "launch failed, reporting compile error"
                );
                converter.compile_error_document(code, &failure)
            }
            None => {
                tracing::debug!(records = self.records.len(), "assembling trace");
                converter.trace_document(code, self.records)
            }
        }
    }

    /// Write a document as UTF-8 JSON.
    pub fn emit(document: &OutputDocument, mut out: impl Write) -> eyre::Result<()> {
        let encoded = document.to_json().wrap_err("encoding output document")?;
        out.write_all(encoded.as_bytes())
            .wrap_err("writing output document")?;
        out.flush().wrap_err("flushing output")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::TracerConfig,
        convert::FrameConverter,
        types::{LaunchFailure, TraceRecord},
    };

    fn assembler_with(n: usize) -> TraceAssembler {
        let mut assembler = TraceAssembler::default();
        for _ in 0..n {
            assembler.push(TraceRecord::sentinel("x"));
        }
        assembler
    }

    #[test]
    fn failed_launch_discards_records() {
        let converter = FrameConverter::new(TracerConfig::default());
        let launch = LaunchResult::failed(LaunchFailure::new("';' expected").at(3, 14));

        let doc = assembler_with(4).finish("int x = 1", Some(launch), &converter);
        match doc {
            OutputDocument::CompileError(err) => {
                assert_eq!(err.code, "int x = 1");
                assert_eq!(err.message, "';' expected");
                assert_eq!((err.line, err.column), (3, 14));
            }
            other => panic!("expected compile error, got {other:?}"),
        }
    }

    #[test]
    fn successful_or_missing_launch_yields_trace() {
        let converter = FrameConverter::new(TracerConfig::default());

        let doc = assembler_with(2).finish("code", Some(LaunchResult::succeeded()), &converter);
        assert!(doc.is_trace());
        assert_eq!(doc.records().len(), 2);

        let doc = assembler_with(1).finish("code", None, &converter);
        assert!(doc.is_trace());
    }

    #[test]
    fn emits_utf8_json() {
        let converter = FrameConverter::new(TracerConfig::default());
        let doc = TraceAssembler::default().finish("s = \"héllo\"", None, &converter);

        let mut out = Vec::new();
        TraceAssembler::emit(&doc, &mut out).unwrap();

        let text = String::from_utf8(out).unwrap();
        assert_eq!(text, r#"{"code":"s = \"héllo\"","trace":[]}"#);
    }
}
