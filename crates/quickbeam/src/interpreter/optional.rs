//! Optional modules scripts can `import` when the host grants the privileges

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::EvalError;
use crate::module::{Module, Privilege};
use crate::value::{NativeResult, Value, ValueRef};

/// Name of the file module.
pub const FILE_MODULE: &str = "file";

/// `file`: read and write files anywhere on the file system.
///
/// - `readFile(path)` returns the contents as a string
/// - `saveFile(content, path)` writes the printed form of `content`
/// - `fileExists(path)` returns 1 or 0
pub fn file_module() -> Module {
    Module::new(
        FILE_MODULE,
        Privilege::FILE_SYSTEM_READ | Privilege::FILE_SYSTEM_WRITE,
    )
    .function("readFile", builtin_read_file)
    .function("saveFile", builtin_save_file)
    .function("fileExists", builtin_file_exists)
}

fn path_arg(name: &str, args: &[ValueRef], index: usize) -> Result<PathBuf, EvalError> {
    match args.get(index).map(ValueRef::get) {
        Some(Value::String(path)) => Ok(PathBuf::from(path)),
        Some(other) => Err(EvalError::type_error(format!(
            "{name} expects a string path, got `{}`",
            other.type_of()
        ))),
        None => Err(EvalError::native(name, "missing path argument")),
    }
}

fn io_error(path: &Path, source: std::io::Error) -> EvalError {
    EvalError::Io {
        path: path.to_path_buf(),
        source,
    }
}

fn builtin_read_file(args: &[ValueRef]) -> NativeResult {
    let path = path_arg("readFile", args, 0)?;
    let text = fs::read_to_string(&path).map_err(|e| io_error(&path, e))?;
    Ok(ValueRef::new(Value::String(text)))
}

fn builtin_save_file(args: &[ValueRef]) -> NativeResult {
    let content = args.first().map(ValueRef::get).unwrap_or_default();
    let path = path_arg("saveFile", args, 1)?;
    fs::write(&path, content.to_string()).map_err(|e| io_error(&path, e))?;
    Ok(ValueRef::null())
}

fn builtin_file_exists(args: &[ValueRef]) -> NativeResult {
    let path = path_arg("fileExists", args, 0)?;
    Ok(ValueRef::new(Value::from(path.exists())))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_requires_both_file_bits() {
        let module = file_module();
        assert!(module.check(Privilege::FILE_SYSTEM_READ).is_err());
        assert!(module
            .check(Privilege::FILE_SYSTEM_READ | Privilege::FILE_SYSTEM_WRITE)
            .is_ok());
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let args = [ValueRef::new(Value::from("/definitely/not/here.qb"))];
        assert!(matches!(
            builtin_read_file(&args),
            Err(EvalError::Io { .. })
        ));
        assert_eq!(builtin_file_exists(&args).unwrap().get(), Value::Int(0));
    }

    #[test]
    fn test_path_must_be_string() {
        let args = [ValueRef::new(Value::Int(3))];
        assert!(matches!(
            builtin_file_exists(&args),
            Err(EvalError::TypeError { .. })
        ));
    }
}
