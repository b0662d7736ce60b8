//! Raw 16-byte key and IV files.
//!
//! The on-disk layout is the bare block with no framing. A file of any other
//! size is reported as [`Error::MalformedInput`], never truncated or padded.

use std::fs;
use std::path::Path;

use aes_core::{Block, BLOCK_LEN};

use crate::error::{Error, Result};

/// Reads exactly one block from `path`; `what` names it in errors.
pub fn read_block(path: &Path, what: &str) -> Result<Block> {
    let bytes = fs::read(path)?;
    <Block>::try_from(bytes.as_slice()).map_err(|_| Error::MalformedInput {
        what: format!("{what} file {}", path.display()),
        expected: BLOCK_LEN,
        got: bytes.len(),
    })
}

/// Writes one block to `path`, replacing any existing file.
pub fn write_block(path: &Path, block: &Block) -> Result<()> {
    fs::write(path, block)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;
    use std::path::PathBuf;

    fn scratch(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("aes-cfb-blockfile-{}", std::process::id()));
        fs::create_dir_all(&dir).expect("create scratch dir");
        dir.join(name)
    }

    #[test]
    fn block_round_trips_through_disk() {
        let path = scratch("key.bin");
        let block: Block = core::array::from_fn(|i| (i * 3) as u8);
        write_block(&path, &block).expect("write");
        assert_eq!(read_block(&path, "key").expect("read"), block);
    }

    #[test]
    fn wrong_size_is_malformed() {
        let path = scratch("short-iv.bin");
        fs::write(&path, [0u8; 12]).expect("write");
        match read_block(&path, "IV") {
            Err(Error::MalformedInput {
                what,
                expected,
                got,
            }) => {
                assert!(what.starts_with("IV file"));
                assert_eq!(expected, 16);
                assert_eq!(got, 12);
            }
            other => panic!("unexpected result: {other:?}"),
        }

        fs::write(&path, [0u8; 17]).expect("write");
        assert!(matches!(
            read_block(&path, "IV"),
            Err(Error::MalformedInput { got: 17, .. })
        ));
    }

    #[test]
    fn missing_file_is_io_error() {
        let path = scratch("does-not-exist.bin");
        let _ = fs::remove_file(&path);
        match read_block(&path, "key") {
            Err(Error::Io(err)) => assert_eq!(err.kind(), io::ErrorKind::NotFound),
            other => panic!("unexpected result: {other:?}"),
        }
    }
}
