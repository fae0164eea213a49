use {
    super::{Error, Transport},
    crate::domain::time::Deadline,
    reqwest::header,
    url::Url,
};

/// Partners answer with a handful of bytes, anything beyond this is not a bid.
const RESPONSE_SIZE_LIMIT: usize = 1024 * 1024;

/// Fetches bids with a `GET` request to the partner endpoint.
#[derive(Debug, Clone)]
pub struct Http {
    client: reqwest::Client,
    endpoint: Url,
}

impl Http {
    pub fn new(client: reqwest::Client, endpoint: Url) -> Self {
        Self { client, endpoint }
    }
}

#[async_trait::async_trait]
impl Transport for Http {
    async fn call(&self, deadline: Deadline) -> Result<Vec<u8>, Error> {
        let timeout = deadline.remaining()?;
        let request = self
            .client
            .get(self.endpoint.clone())
            .header(header::ACCEPT, "application/json")
            .timeout(timeout);
        send(RESPONSE_SIZE_LIMIT, request).await
    }
}

async fn send(limit_bytes: usize, req: reqwest::RequestBuilder) -> Result<Vec<u8>, Error> {
    let mut res = req.send().await?;
    let status = res.status();
    if !status.is_success() {
        return Err(Error::Status(status.as_u16()));
    }
    let mut data = Vec::new();
    while let Some(chunk) = res.chunk().await? {
        if data.len() + chunk.len() > limit_bytes {
            return Err(Error::ResponseTooLarge { limit_bytes });
        }
        data.extend_from_slice(&chunk);
    }
    Ok(data)
}
