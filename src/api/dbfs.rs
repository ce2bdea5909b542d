//! Purpose: DBFS file wrappers (`/api/2.0/dbfs/*`) including chunked upload and download.
//! Exports: `DbfsApi`, `FileInfo`, `ReadBlock`, `DBFS_BLOCK_SIZE`.
//! Role: Base64 framing of file contents; streaming helpers over the block calls.
//! Invariants: No single request carries more than `DBFS_BLOCK_SIZE` decoded bytes.
//! Invariants: `upload` always pairs `create` with `close` on success.
#![allow(clippy::result_large_err)]

use super::client::{ApiResult, DatabricksClient, Endpoint};
use crate::core::epoch_ms;
use crate::core::error::{Error, ErrorKind};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};
use std::io::{Read, Write};
use time::OffsetDateTime;

/// Largest payload the service accepts for `put`, `add-block` and `read`.
pub const DBFS_BLOCK_SIZE: usize = 1024 * 1024;

#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct FileInfo {
    pub path: String,
    #[serde(default)]
    pub is_dir: bool,
    #[serde(default)]
    pub file_size: i64,
    #[serde(default, with = "epoch_ms", skip_serializing_if = "Option::is_none")]
    pub modification_time: Option<OffsetDateTime>,
}

/// Decoded result of one `read` call.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct ReadBlock {
    pub bytes_read: u64,
    pub data: Vec<u8>,
}

#[derive(Serialize)]
struct PathBody<'a> {
    path: &'a str,
}

#[derive(Serialize)]
struct DeleteBody<'a> {
    path: &'a str,
    recursive: bool,
}

#[derive(Serialize)]
struct MoveBody<'a> {
    source_path: &'a str,
    destination_path: &'a str,
}

#[derive(Serialize)]
struct PutBody<'a> {
    path: &'a str,
    contents: String,
    overwrite: bool,
}

#[derive(Serialize)]
struct CreateBody<'a> {
    path: &'a str,
    overwrite: bool,
}

#[derive(Serialize)]
struct AddBlockBody {
    handle: i64,
    data: String,
}

#[derive(Serialize)]
struct HandleBody {
    handle: i64,
}

#[derive(Deserialize)]
struct FilesEnvelope {
    #[serde(default)]
    files: Vec<FileInfo>,
}

#[derive(Deserialize)]
struct HandleEnvelope {
    handle: i64,
}

#[derive(Deserialize)]
struct ReadEnvelope {
    #[serde(default)]
    bytes_read: u64,
    #[serde(default)]
    data: String,
}

pub struct DbfsApi<'a> {
    client: &'a DatabricksClient,
}

impl<'a> DbfsApi<'a> {
    pub(crate) fn new(client: &'a DatabricksClient) -> Self {
        Self { client }
    }

    pub fn list(&self, path: &str) -> ApiResult<Vec<FileInfo>> {
        let envelope: FilesEnvelope = self
            .client
            .get(Endpoint::new("/api/2.0/dbfs/list").query("path", path))?;
        Ok(envelope.files)
    }

    pub fn get_status(&self, path: &str) -> ApiResult<FileInfo> {
        self.client
            .get(Endpoint::new("/api/2.0/dbfs/get-status").query("path", path))
    }

    pub fn mkdirs(&self, path: &str) -> ApiResult<()> {
        self.client
            .post_unit(Endpoint::new("/api/2.0/dbfs/mkdirs"), &PathBody { path })
    }

    pub fn delete(&self, path: &str, recursive: bool) -> ApiResult<()> {
        self.client.post_unit(
            Endpoint::new("/api/2.0/dbfs/delete"),
            &DeleteBody { path, recursive },
        )
    }

    pub fn move_path(&self, source_path: &str, destination_path: &str) -> ApiResult<()> {
        self.client.post_unit(
            Endpoint::new("/api/2.0/dbfs/move"),
            &MoveBody {
                source_path,
                destination_path,
            },
        )
    }

    /// Single-request upload; contents above one block must go through `upload`.
    pub fn put(&self, path: &str, contents: &[u8], overwrite: bool) -> ApiResult<()> {
        if contents.len() > DBFS_BLOCK_SIZE {
            return Err(Error::new(ErrorKind::Usage)
                .with_message(format!(
                    "inline put is limited to {DBFS_BLOCK_SIZE} bytes, got {}",
                    contents.len()
                ))
                .with_hint("Use `dbrest dbfs upload` for larger files."));
        }
        let body = PutBody {
            path,
            contents: STANDARD.encode(contents),
            overwrite,
        };
        self.client
            .post_unit(Endpoint::new("/api/2.0/dbfs/put"), &body)
    }

    pub fn read(&self, path: &str, offset: u64, length: usize) -> ApiResult<ReadBlock> {
        let endpoint = Endpoint::new("/api/2.0/dbfs/read")
            .query("path", path)
            .query("offset", offset)
            .query("length", length.min(DBFS_BLOCK_SIZE));
        let envelope: ReadEnvelope = self.client.get(endpoint)?;
        let data = STANDARD.decode(envelope.data.as_bytes()).map_err(|err| {
            Error::new(ErrorKind::Format)
                .with_message("dbfs read returned invalid base64")
                .with_endpoint("/api/2.0/dbfs/read")
                .with_source(err)
        })?;
        Ok(ReadBlock {
            bytes_read: envelope.bytes_read,
            data,
        })
    }

    /// Opens a streaming write handle.
    pub fn create(&self, path: &str, overwrite: bool) -> ApiResult<i64> {
        let envelope: HandleEnvelope = self.client.post(
            Endpoint::new("/api/2.0/dbfs/create"),
            &CreateBody { path, overwrite },
        )?;
        Ok(envelope.handle)
    }

    pub fn add_block(&self, handle: i64, data: &[u8]) -> ApiResult<()> {
        if data.len() > DBFS_BLOCK_SIZE {
            return Err(Error::new(ErrorKind::Usage).with_message(format!(
                "block is limited to {DBFS_BLOCK_SIZE} bytes, got {}",
                data.len()
            )));
        }
        let body = AddBlockBody {
            handle,
            data: STANDARD.encode(data),
        };
        self.client
            .post_unit(Endpoint::new("/api/2.0/dbfs/add-block"), &body)
    }

    pub fn close(&self, handle: i64) -> ApiResult<()> {
        self.client
            .post_unit(Endpoint::new("/api/2.0/dbfs/close"), &HandleBody { handle })
    }

    /// Streams `source` into `path` as create, one add-block per block, close.
    /// Returns the number of bytes sent.
    pub fn upload<R: Read>(&self, path: &str, mut source: R, overwrite: bool) -> ApiResult<u64> {
        let handle = self.create(path, overwrite)?;
        let mut total = 0u64;
        let mut block = Vec::with_capacity(DBFS_BLOCK_SIZE);
        loop {
            block.clear();
            source
                .by_ref()
                .take(DBFS_BLOCK_SIZE as u64)
                .read_to_end(&mut block)
                .map_err(|err| {
                    Error::new(ErrorKind::Io)
                        .with_message("failed to read upload source")
                        .with_source(err)
                })?;
            if block.is_empty() {
                break;
            }
            self.add_block(handle, &block)?;
            total += block.len() as u64;
            tracing::trace!(handle, bytes = total, "dbfs block sent");
        }
        self.close(handle)?;
        Ok(total)
    }

    /// Reads `path` block by block into `sink`. Returns the number of bytes written.
    pub fn download<W: Write>(&self, path: &str, mut sink: W) -> ApiResult<u64> {
        let mut offset = 0u64;
        loop {
            let block = self.read(path, offset, DBFS_BLOCK_SIZE)?;
            if block.bytes_read == 0 || block.data.is_empty() {
                break;
            }
            sink.write_all(&block.data).map_err(|err| {
                Error::new(ErrorKind::Io)
                    .with_message("failed to write download target")
                    .with_source(err)
            })?;
            offset += block.data.len() as u64;
        }
        sink.flush().map_err(|err| {
            Error::new(ErrorKind::Io)
                .with_message("failed to flush download target")
                .with_source(err)
        })?;
        Ok(offset)
    }
}
