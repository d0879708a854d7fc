//! Authorization bootstrap
//!
//! A minimal HTTP listener for the one-time OAuth callback. Google
//! redirects the operator's browser to `/callback?code=...` after
//! consent; the code is exchanged for the process credential and the
//! poll scheduler starts. The listener keeps accepting afterwards so
//! stray browser retries still get a well-formed response, but the
//! scheduler is only ever started once.

use anyhow::{Context, Result};
use log::{info, warn};
use mail::GmailAuth;
use std::io::{BufRead, BufReader, Write};
use std::net::{TcpListener, TcpStream};

const SUCCESS_BODY: &str = "Authentication successful! You can close this page.";
const FAILURE_BODY: &str = "Authentication failed.";
const NO_CODE_BODY: &str = "Authorization code not found.";

/// The OAuth callback listener
pub struct CallbackServer {
    listener: TcpListener,
}

impl CallbackServer {
    /// Bind to the configured callback port on all interfaces
    pub fn bind(port: u16) -> Result<Self> {
        let listener = TcpListener::bind(("0.0.0.0", port))
            .with_context(|| format!("Failed to bind callback server to port {port}"))?;
        Ok(Self { listener })
    }

    /// Accept callback requests forever.
    ///
    /// `on_authorized` runs after every request once the credential is
    /// installed, so it must tolerate repeat invocations; the caller
    /// guards it so the scheduler starts at most once.
    pub fn run(&self, auth: &GmailAuth, mut on_authorized: impl FnMut()) {
        for stream in self.listener.incoming() {
            let stream = match stream {
                Ok(stream) => stream,
                Err(e) => {
                    warn!("Failed to accept connection: {e}");
                    continue;
                }
            };

            if let Err(e) = handle_connection(stream, auth) {
                warn!("Error handling callback request: {e}");
            }

            // The exchange may have installed the credential on this
            // request or an earlier one
            if auth.is_authorized() {
                on_authorized();
            }
        }
    }
}

/// Read one request, answer it, close the connection
fn handle_connection(mut stream: TcpStream, auth: &GmailAuth) -> Result<()> {
    let mut reader = BufReader::new(&stream);
    let mut request_line = String::new();
    reader
        .read_line(&mut request_line)
        .context("Failed to read request")?;

    if !is_callback_path(&request_line) {
        return respond(&mut stream, "404 Not Found", "Not found.");
    }

    let Some(code) = query_param(&request_line, "code") else {
        // The redirect can also carry an error param (consent denied)
        if let Some(err) = query_param(&request_line, "error") {
            warn!("Authorization callback returned error: {err}");
        }
        return respond(&mut stream, "200 OK", NO_CODE_BODY);
    };

    match auth.exchange_code(&code) {
        Ok(()) => {
            info!("Authentication successful!");
            respond(&mut stream, "200 OK", SUCCESS_BODY)
        }
        Err(e) => {
            warn!("Authentication error: {e}");
            respond(&mut stream, "200 OK", FAILURE_BODY)
        }
    }
}

/// Write a plain-text HTTP response
fn respond(stream: &mut TcpStream, status: &str, body: &str) -> Result<()> {
    let response = format!(
        "HTTP/1.1 {}\r\nContent-Type: text/plain\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        status,
        body.len(),
        body
    );
    stream
        .write_all(response.as_bytes())
        .context("Failed to write response")?;
    Ok(())
}

/// Whether the request line targets the callback endpoint
fn is_callback_path(request_line: &str) -> bool {
    request_line
        .split_whitespace()
        .nth(1)
        .and_then(|path| path.split('?').next())
        .is_some_and(|path| path == "/callback")
}

/// Extract a query parameter from the request line.
///
/// Format: `GET /callback?code=AUTH_CODE&scope=... HTTP/1.1`
fn query_param(request_line: &str, name: &str) -> Option<String> {
    request_line
        .split_whitespace()
        .nth(1)
        .and_then(|path| path.split('?').nth(1))
        .and_then(|query| {
            query.split('&').find_map(|param| {
                let (key, value) = param.split_once('=')?;
                (key == name).then(|| percent_decode(value))
            })
        })
}

/// Decode percent-encoding the browser applied to the parameter value
fn percent_decode(value: &str) -> String {
    urlencoding::decode(value)
        .map(|s| s.into_owned())
        .unwrap_or_else(|_| value.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_callback_path() {
        assert!(is_callback_path("GET /callback?code=abc HTTP/1.1\r\n"));
        assert!(is_callback_path("GET /callback HTTP/1.1\r\n"));
        assert!(!is_callback_path("GET /favicon.ico HTTP/1.1\r\n"));
        assert!(!is_callback_path("GET / HTTP/1.1\r\n"));
        assert!(!is_callback_path("\r\n"));
    }

    #[test]
    fn test_query_param_extracts_code() {
        let line = "GET /callback?code=4%2FAUTH_CODE&scope=gmail HTTP/1.1\r\n";
        assert_eq!(query_param(line, "code"), Some("4/AUTH_CODE".to_string()));
        assert_eq!(query_param(line, "scope"), Some("gmail".to_string()));
    }

    #[test]
    fn test_query_param_absent() {
        let line = "GET /callback?error=access_denied HTTP/1.1\r\n";
        assert_eq!(query_param(line, "code"), None);
        assert_eq!(
            query_param(line, "error"),
            Some("access_denied".to_string())
        );
    }

    #[test]
    fn test_query_param_without_query_string() {
        assert_eq!(query_param("GET /callback HTTP/1.1\r\n", "code"), None);
    }

    #[test]
    fn test_query_param_value_containing_equals() {
        // An unencoded '=' inside the value must not truncate it
        let line = "GET /callback?code=4/ab==cd&scope=gmail HTTP/1.1\r\n";
        assert_eq!(query_param(line, "code"), Some("4/ab==cd".to_string()));
    }
}
