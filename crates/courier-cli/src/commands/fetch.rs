//! Fetch command implementation.

use std::io::Write;

use bytes::Bytes;
use clap::Parser;
use courier_common_http::{HeaderMap, Method, RequestDescriptor, ReqwestTransport, Response};
use courier_dispatch::RequestDispatcher;

use crate::cli::{CommandContext, OutputFormat};
use crate::error::CliError;

/// Dispatch a request and print the response
#[derive(Debug, Parser)]
pub struct FetchCommand {
    /// URL to request; relative URLs need --base
    pub url: String,

    /// HTTP method
    #[arg(short = 'X', long, default_value = "GET")]
    pub method: String,

    /// Request payload
    #[arg(short, long)]
    pub data: Option<String>,

    /// Extra header as "Name: value" (repeatable)
    #[arg(short = 'H', long = "header", value_name = "NAME: VALUE")]
    pub headers: Vec<String>,

    /// Base URL that relative URLs are resolved against
    #[arg(short, long)]
    pub base: Option<String>,

    /// Print response headers
    #[arg(short, long)]
    pub include: bool,

    /// Number of times to send the request; repeats exercise cache and throttle
    #[arg(short = 'n', long, default_value_t = 1)]
    pub repeat: u32,
}

/// Parse repeated `Name: value` arguments.
pub fn parse_headers(raw: &[String]) -> Result<HeaderMap, CliError> {
    let mut headers = HeaderMap::new();
    for line in raw {
        let (name, value) = line.split_once(':').ok_or_else(|| {
            CliError::validation(format!("invalid header {line:?}, expected NAME: VALUE"), "header")
        })?;
        let name = name.trim();
        if name.is_empty() {
            return Err(CliError::validation(
                format!("invalid header {line:?}, empty name"),
                "header",
            ));
        }
        headers.insert(name.to_ascii_lowercase(), value.trim().to_string());
    }
    Ok(headers)
}

impl FetchCommand {
    pub async fn execute(&self, ctx: &CommandContext) -> Result<(), CliError> {
        let method: Method = self
            .method
            .parse()
            .map_err(|e| CliError::validation(format!("{e}"), "method"))?;
        let headers = parse_headers(&self.headers)?;

        let transport = ReqwestTransport::from_settings(&ctx.config.http)
            .map_err(|e| CliError::config(format!("failed to build HTTP client: {e}")))?;

        let mut builder = RequestDispatcher::builder(transport).config(&ctx.config);
        if let Some(base) = &self.base {
            builder = builder.base_url(base.clone());
        }
        let dispatcher = builder.build();

        for _ in 0..self.repeat.max(1) {
            let mut request = RequestDescriptor::new(method, self.url.clone()).headers(headers.clone());
            request.payload = self.data.clone().map(Bytes::from);

            let response = dispatcher
                .dispatch(request)
                .await
                .map_err(|e| CliError::dispatch(&self.url, e))?;

            self.print(&response, ctx.format)?;
        }

        Ok(())
    }

    fn print(&self, response: &Response, format: OutputFormat) -> Result<(), CliError> {
        match format {
            OutputFormat::Json => {
                let value = serde_json::json!({
                    "status": response.status(),
                    "headers": response.headers(),
                    "body": response.text(),
                    "from_cache": response.from_cache(),
                });
                println!("{value}");
            }
            OutputFormat::Text => {
                let mut stdout = std::io::stdout().lock();
                let write = |stdout: &mut std::io::StdoutLock<'_>| -> std::io::Result<()> {
                    if self.include {
                        writeln!(stdout, "status: {}", response.status())?;
                        for (name, value) in response.headers() {
                            writeln!(stdout, "{name}: {value}")?;
                        }
                        writeln!(stdout)?;
                    }
                    stdout.write_all(response.body())?;
                    stdout.flush()
                };
                write(&mut stdout).map_err(|e| CliError::io("failed to write response", e))?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_headers() {
        let headers = parse_headers(&[
            "Accept: application/json".to_string(),
            "X-Url: http://a:8080/".to_string(),
        ])
        .unwrap();

        assert_eq!(headers.get("accept").map(String::as_str), Some("application/json"));
        assert_eq!(headers.get("x-url").map(String::as_str), Some("http://a:8080/"));
    }

    #[test]
    fn test_parse_headers_rejects_malformed() {
        assert!(parse_headers(&["no colon".to_string()]).is_err());
        assert!(parse_headers(&[": value".to_string()]).is_err());
    }
}
