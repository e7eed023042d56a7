//! Conversion by an external native executable

use super::{Converter, ConverterKind};
use crate::error::ConversionError;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use tracing::{debug, warn};

/// Runs `<program> <delimited> <spreadsheet>` and waits for it to exit
///
/// Exit status 0 is success. Anything the tool prints on stderr is logged;
/// stdout is discarded.
#[derive(Debug, Clone)]
pub struct NativeProcessConverter {
    program: PathBuf,
}

impl NativeProcessConverter {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        NativeProcessConverter {
            program: program.into(),
        }
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    fn program_name(&self) -> String {
        self.program.display().to_string()
    }
}

impl Converter for NativeProcessConverter {
    fn convert(&self, delimited: &Path, spreadsheet: &Path) -> Result<(), ConversionError> {
        debug!(
            program = %self.program.display(),
            input = %delimited.display(),
            output = %spreadsheet.display(),
            "running native converter"
        );

        let output = Command::new(&self.program)
            .arg(delimited)
            .arg(spreadsheet)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .output()
            .map_err(|source| ConversionError::Launch {
                program: self.program_name(),
                source,
            })?;

        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();

        if !output.status.success() {
            warn!(program = %self.program.display(), status = %output.status, %stderr, "native converter failed");
            return Err(ConversionError::Exit {
                program: self.program_name(),
                status: output.status,
                stderr,
            });
        }

        if !stderr.is_empty() {
            warn!(program = %self.program.display(), %stderr, "native converter reported problems");
        }

        if !spreadsheet.is_file() {
            return Err(ConversionError::Write(format!(
                "'{}' exited successfully but did not create {}",
                self.program_name(),
                spreadsheet.display()
            )));
        }

        Ok(())
    }

    fn kind(&self) -> ConverterKind {
        ConverterKind::NativeProcess
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_success_passes_both_paths() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("in.csv");
        let output = dir.path().join("in.xlsx");
        fs::write(&input, "\"A\"\n").unwrap();

        // cp <in> <out> follows the same calling convention
        NativeProcessConverter::new("cp")
            .convert(&input, &output)
            .unwrap();

        assert_eq!(fs::read_to_string(&output).unwrap(), "\"A\"\n");
    }

    #[test]
    fn test_nonzero_exit_is_error() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("in.csv");
        fs::write(&input, "").unwrap();

        let err = NativeProcessConverter::new("false")
            .convert(&input, &dir.path().join("out.xlsx"))
            .unwrap_err();

        match err {
            ConversionError::Exit { status, .. } => assert!(!status.success()),
            other => panic!("expected exit error, got {:?}", other),
        }
    }

    #[test]
    fn test_stderr_is_captured() {
        let dir = tempdir().unwrap();
        let missing = dir.path().join("missing.csv");

        let err = NativeProcessConverter::new("cp")
            .convert(&missing, &dir.path().join("out.xlsx"))
            .unwrap_err();

        match err {
            ConversionError::Exit { stderr, .. } => assert!(!stderr.is_empty()),
            other => panic!("expected exit error, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_program_is_launch_error() {
        let dir = tempdir().unwrap();
        let converter = NativeProcessConverter::new(dir.path().join("csv2xlsx"));

        let err = converter
            .convert(&dir.path().join("a.csv"), &dir.path().join("a.xlsx"))
            .unwrap_err();
        assert!(matches!(err, ConversionError::Launch { .. }));
        assert!(err.to_string().contains("csv2xlsx"));
        assert_eq!(converter.program(), dir.path().join("csv2xlsx"));
        assert_eq!(converter.kind(), ConverterKind::NativeProcess);
    }

    #[test]
    fn test_success_without_output_is_error() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("in.csv");
        fs::write(&input, "").unwrap();

        let err = NativeProcessConverter::new("true")
            .convert(&input, &dir.path().join("out.xlsx"))
            .unwrap_err();
        assert!(matches!(err, ConversionError::Write(_)));
    }
}
