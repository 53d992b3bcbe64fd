// API client module: a small blocking HTTP client for the Drive v3 REST
// API. Implements `RemoteClient` so the browsing core never touches HTTP
// directly.

use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::Path;

use reqwest::blocking::{Client, RequestBuilder, Response};
use reqwest::header::{
    HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_LENGTH, CONTENT_RANGE, LOCATION, RANGE,
};
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use crate::config::Config;
use crate::entry::{Entry, FileResource};
use crate::error::{BrowseError, Result};
use crate::progress::{ProgressCallback, TransferProgress};
use crate::remote::{ByteStream, FileMetadata, ListPage, RemoteClient};

/// Resumable upload chunks must be a multiple of 256 KiB.
const UPLOAD_CHUNK_SIZE: usize = 4 * 256 * 1024;

/// Consecutive 308 answers that keep no new bytes before giving up.
const MAX_STALLED_CHUNKS: usize = 3;

const LIST_FIELDS: &str = "nextPageToken, files(id, name, mimeType)";
const FILE_FIELDS: &str = "id, name, mimeType";

/// Blocking Drive client holding the HTTP client, the API base URL and the
/// bearer token used for every call.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    token: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct FileListResponse {
    #[serde(default)]
    files: Vec<FileResource>,
    next_page_token: Option<String>,
}

impl ApiClient {
    /// Build a client for `config.api_url` authenticated with `token`.
    pub fn new(config: &Config, token: &str) -> Result<Self> {
        // Resumable uploads answer 308 without a Location; never follow it.
        let client = Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .build()?;
        Ok(Self {
            client,
            base_url: config.api_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
        })
    }

    fn authorized(&self, req: RequestBuilder) -> Result<RequestBuilder> {
        let value = HeaderValue::from_str(&format!("Bearer {}", self.token))
            .map_err(|_| BrowseError::Remote("access token is not a valid header value".into()))?;
        Ok(req.header(AUTHORIZATION, value))
    }

    fn files_url(&self) -> String {
        format!("{}/drive/v3/files", self.base_url)
    }

    /// Send a byte-transfer request and turn a non-success status into a
    /// `Transfer` error carrying the response body.
    fn open_stream(&self, req: RequestBuilder) -> Result<ByteStream> {
        let res = self.authorized(req)?.send()?;
        let res = check_status(res).map_err(|(status, detail)| BrowseError::Transfer {
            status: Some(status.as_u16()),
            detail,
        })?;
        let total = res.content_length();
        Ok(ByteStream::new(res, total))
    }

    /// Start a resumable upload session and return its session URI.
    fn start_upload(&self, metadata: &FileMetadata, size: u64) -> Result<String> {
        let url = format!("{}/upload/drive/v3/files", self.base_url);
        let body = json!({
            "name": metadata.name,
            "mimeType": metadata.mime_type,
            "parents": [metadata.parent_id],
        });
        let req = self
            .client
            .post(&url)
            .query(&[("uploadType", "resumable"), ("fields", FILE_FIELDS)])
            .header("X-Upload-Content-Type", metadata.mime_type.as_str())
            .header("X-Upload-Content-Length", size)
            .json(&body);
        let res = self.authorized(req)?.send()?;
        let res = check_status(res).map_err(|(status, detail)| BrowseError::Transfer {
            status: Some(status.as_u16()),
            detail,
        })?;

        res.headers()
            .get(LOCATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
            .ok_or_else(|| BrowseError::Remote("upload session has no Location header".into()))
    }

    /// Ask an upload session for its status. Once every byte has been
    /// acknowledged this is also what completes the upload.
    fn query_upload(&self, session: &str, size: u64) -> Result<Response> {
        let req = self
            .client
            .put(session)
            .header(CONTENT_LENGTH, 0)
            .header(CONTENT_RANGE, format!("bytes */{size}"));
        send_chunk(self.authorized(req)?)
    }
}

impl RemoteClient for ApiClient {
    fn list_children(&self, folder_id: &str, page_token: Option<&str>) -> Result<ListPage> {
        let query = format!("'{}' in parents and trashed = false", folder_id.replace('\'', "\\'"));
        let mut params = vec![
            ("q", query.as_str()),
            ("spaces", "drive"),
            ("fields", LIST_FIELDS),
        ];
        if let Some(token) = page_token {
            params.push(("pageToken", token));
        }

        debug!(folder_id, page_token, "listing folder page");
        let req = self.client.get(self.files_url()).query(&params);
        let res = self.authorized(req)?.send()?;
        let res = check_status(res)
            .map_err(|(status, detail)| BrowseError::Remote(format!("{status}: {detail}")))?;
        let page: FileListResponse = serde_json::from_str(&res.text()?)?;

        Ok(ListPage {
            entries: page.files.into_iter().map(Entry::from).collect(),
            next_page_token: page.next_page_token,
        })
    }

    fn fetch_bytes(&self, file_id: &str) -> Result<ByteStream> {
        let url = format!("{}/{}", self.files_url(), file_id);
        self.open_stream(self.client.get(url).query(&[("alt", "media")]))
    }

    fn export_bytes(&self, file_id: &str, mime_type: &str) -> Result<ByteStream> {
        let url = format!("{}/{}/export", self.files_url(), file_id);
        self.open_stream(self.client.get(url).query(&[("mimeType", mime_type)]))
    }

    fn create_file(
        &self,
        metadata: &FileMetadata,
        local_path: &Path,
        progress: ProgressCallback<'_>,
    ) -> Result<Entry> {
        let mut file = File::open(local_path)
            .map_err(|_| BrowseError::FileNotFound(local_path.display().to_string()))?;
        let size = file.metadata()?.len();
        let session = self.start_upload(metadata, size)?;
        debug!(name = %metadata.name, size, "upload session started");

        if size == 0 {
            let res = self.query_upload(&session, 0)?;
            progress(&TransferProgress::new(0, Some(0), metadata.name.clone()));
            return finish_upload(res);
        }

        let mut buf = vec![0u8; UPLOAD_CHUNK_SIZE];
        let mut offset = 0u64;
        let mut reported = 0u64;
        let mut stalled = 0usize;
        loop {
            // everything below `offset` has been acknowledged by the server
            let res = if offset >= size {
                self.query_upload(&session, size)?
            } else {
                file.seek(SeekFrom::Start(offset))?;
                let n = read_full(&mut file, &mut buf)?;
                if n == 0 {
                    return Err(BrowseError::Transfer {
                        status: None,
                        detail: format!(
                            "{} ended before {size} bytes were sent",
                            local_path.display()
                        ),
                    });
                }
                let end = offset + n as u64 - 1;
                let req = self
                    .client
                    .put(&session)
                    .header(CONTENT_RANGE, format!("bytes {offset}-{end}/{size}"))
                    .body(buf[..n].to_vec());
                send_chunk(self.authorized(req)?)?
            };

            if res.status() != StatusCode::PERMANENT_REDIRECT {
                progress(&TransferProgress::new(size, Some(size), metadata.name.clone()));
                return finish_upload(res);
            }

            let acknowledged = acknowledged_bytes(res.headers())?.min(size);
            if acknowledged <= offset {
                stalled += 1;
                if stalled >= MAX_STALLED_CHUNKS {
                    return Err(BrowseError::Transfer {
                        status: Some(308),
                        detail: format!("upload stalled at {acknowledged} of {size} bytes"),
                    });
                }
            } else {
                stalled = 0;
            }
            if acknowledged < offset {
                debug!(name = %metadata.name, offset, acknowledged, "server kept fewer bytes, resending");
            }
            offset = acknowledged;

            if offset > reported {
                reported = offset;
                progress(&TransferProgress::new(offset, Some(size), metadata.name.clone()));
            }
        }
    }
}

/// Bytes the server has persisted, from the `Range: bytes=0-N` header of a
/// 308 answer. No header means nothing was kept.
fn acknowledged_bytes(headers: &HeaderMap) -> Result<u64> {
    let Some(range) = headers.get(RANGE) else {
        return Ok(0);
    };
    range
        .to_str()
        .ok()
        .and_then(|v| v.trim().strip_prefix("bytes="))
        .and_then(|v| v.split_once('-'))
        .and_then(|(start, end)| {
            (start.trim() == "0").then_some(())?;
            end.trim().parse::<u64>().ok()
        })
        .map(|end| end + 1)
        .ok_or_else(|| BrowseError::Transfer {
            status: Some(308),
            detail: format!("unexpected Range header {range:?}"),
        })
}

/// Split a response into success or `(status, body)`.
fn check_status(res: Response) -> std::result::Result<Response, (StatusCode, String)> {
    let status = res.status();
    if status.is_success() {
        Ok(res)
    } else {
        let body = res.text().unwrap_or_default();
        Err((status, body))
    }
}

/// Send one upload chunk. 308 means "more please" and is not an error.
fn send_chunk(req: RequestBuilder) -> Result<Response> {
    let res = req.send()?;
    if res.status() == StatusCode::PERMANENT_REDIRECT {
        return Ok(res);
    }
    check_status(res).map_err(|(status, detail)| BrowseError::Transfer {
        status: Some(status.as_u16()),
        detail,
    })
}

fn finish_upload(res: Response) -> Result<Entry> {
    if res.status() == StatusCode::PERMANENT_REDIRECT {
        return Err(BrowseError::Transfer {
            status: Some(308),
            detail: "upload incomplete".into(),
        });
    }
    let created: FileResource = serde_json::from_str(&res.text()?)?;
    Ok(Entry::from(created))
}

/// Fill `buf` as far as the reader allows; returns bytes read.
fn read_full<R: Read>(reader: &mut R, buf: &mut [u8]) -> std::io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}
