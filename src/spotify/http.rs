use reqwest::Response;
use tracing::debug;

use crate::error::{AppError, Result};

/// Drains a response into one contiguous buffer.
///
/// The buffer grows chunk by chunk, so bodies of unknown length are fine.
/// A non-success status becomes `AppError::Api` carrying whatever text the
/// server sent back.
pub async fn read_body(mut response: Response) -> Result<Vec<u8>> {
    let status = response.status();
    let mut body = Vec::new();

    while let Some(chunk) = response.chunk().await? {
        body.extend_from_slice(&chunk);
    }

    debug!("Received {} bytes ({})", body.len(), status);

    if !status.is_success() {
        return Err(AppError::Api {
            status: status.as_u16(),
            message: String::from_utf8_lossy(&body).trim().to_string(),
        });
    }

    Ok(body)
}
