use std::io::{BufRead, BufReader, Write};
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::browser::driver::Driver;
use crate::error::DriverError;
use crate::page::element::{ElementHandle, RawElement};

/// How to start the browser server process.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DriverConfig {
    #[serde(default = "default_node")]
    pub node: String,

    /// Path of the browser server script.
    #[serde(default = "default_script")]
    pub script: String,

    /// Attributes read as the element's marker value, first present wins.
    #[serde(default = "default_marker_attributes")]
    pub marker_attributes: Vec<String>,

    #[serde(default = "default_true")]
    pub headless: bool,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            node: default_node(),
            script: default_script(),
            marker_attributes: default_marker_attributes(),
            headless: true,
        }
    }
}

fn default_node() -> String { "node".to_string() }
fn default_script() -> String { "node/browser_server.js".to_string() }
fn default_marker_attributes() -> Vec<String> {
    vec!["data-attr-id".to_string(), "data-atr-id".to_string()]
}
fn default_true() -> bool { true }

/// Request sent to the browser server over stdin (one JSON line).
#[derive(Debug, Serialize)]
#[serde(tag = "cmd", rename_all = "snake_case")]
pub enum BrowserRequest<'a> {
    Navigate {
        url: &'a str,
    },
    Snapshot {
        #[serde(rename = "markerAttributes")]
        marker_attributes: &'a [String],
    },
    Refresh {
        handle: &'a str,
        #[serde(rename = "markerAttributes")]
        marker_attributes: &'a [String],
    },
    Click {
        handle: &'a str,
    },
    SetValue {
        handle: &'a str,
        value: &'a str,
    },
    Drag {
        from: &'a str,
        to: &'a str,
    },
    Execute {
        script: &'a str,
        #[serde(skip_serializing_if = "Option::is_none")]
        handle: Option<&'a str>,
    },
    CurrentUrl,
    Quit,
}

impl BrowserRequest<'_> {
    fn name(&self) -> &'static str {
        match self {
            BrowserRequest::Navigate { .. } => "navigate",
            BrowserRequest::Snapshot { .. } => "snapshot",
            BrowserRequest::Refresh { .. } => "refresh",
            BrowserRequest::Click { .. } => "click",
            BrowserRequest::SetValue { .. } => "set_value",
            BrowserRequest::Drag { .. } => "drag",
            BrowserRequest::Execute { .. } => "execute",
            BrowserRequest::CurrentUrl => "current_url",
            BrowserRequest::Quit => "quit",
        }
    }
}

/// Response received from the browser server over stdout (one JSON line).
#[derive(Debug, Deserialize)]
pub struct BrowserResponse {
    pub ok: bool,
    #[serde(default)]
    pub error: Option<String>,
    /// `stale`, `intercepted`, `timeout` or absent for permanent failures.
    #[serde(default, rename = "errorKind")]
    pub error_kind: Option<String>,
    #[serde(default)]
    pub elements: Option<Vec<RawElement>>,
    #[serde(default)]
    pub element: Option<RawElement>,
    #[serde(default)]
    pub value: Option<Value>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub ready: Option<bool>,
}

impl BrowserResponse {
    fn into_error(self, command: &str) -> DriverError {
        let message = self.error.unwrap_or_else(|| "Unknown error".into());
        match self.error_kind.as_deref() {
            Some("stale") => DriverError::StaleElement(message),
            Some("intercepted") => DriverError::Intercepted(message),
            Some("timeout") => DriverError::Timeout(message),
            Some("unsupported") => DriverError::Unsupported(message),
            _ => DriverError::Protocol {
                command: command.to_string(),
                message,
            },
        }
    }
}

/// A persistent browser session backed by a Node.js browser server.
///
/// The server keeps one page open and answers NDJSON requests on stdin with
/// one response line on stdout. Element handles are ids the server assigns
/// during a snapshot.
pub struct BrowserSession {
    child: Child,
    stdin: ChildStdin,
    reader: BufReader<ChildStdout>,
    config: DriverConfig,
    current_url: Option<String>,
    closed: bool,
}

impl BrowserSession {
    /// Spawn the browser server and wait for its ready line.
    pub fn launch(config: DriverConfig) -> Result<Self, DriverError> {
        let mut command = Command::new(&config.node);
        command.arg(&config.script);
        if !config.headless {
            command.arg("--headed");
        }

        let mut child = command
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .spawn()?;

        let stdin = child.stdin.take().ok_or_else(|| DriverError::Protocol {
            command: "launch".into(),
            message: "failed to capture stdin of the browser server".into(),
        })?;

        let stdout = child.stdout.take().ok_or_else(|| DriverError::Protocol {
            command: "launch".into(),
            message: "failed to capture stdout of the browser server".into(),
        })?;

        let mut reader = BufReader::new(stdout);

        let mut line = String::new();
        reader.read_line(&mut line)?;

        let response: BrowserResponse =
            serde_json::from_str(line.trim()).map_err(|e| DriverError::Json {
                context: "browser server ready signal".into(),
                source: e,
            })?;

        if !response.ok || response.ready != Some(true) {
            return Err(DriverError::Protocol {
                command: "launch".into(),
                message: "did not receive ready signal from the browser server".into(),
            });
        }

        debug!(script = %config.script, "browser session ready");
        Ok(BrowserSession {
            child,
            stdin,
            reader,
            config,
            current_url: None,
            closed: false,
        })
    }

    /// Send a request and read the response.
    fn send(&mut self, request: &BrowserRequest<'_>) -> Result<BrowserResponse, DriverError> {
        let json = serde_json::to_string(request).map_err(|e| DriverError::Json {
            context: "BrowserRequest".into(),
            source: e,
        })?;

        writeln!(self.stdin, "{}", json)?;
        self.stdin.flush()?;

        let mut line = String::new();
        self.reader.read_line(&mut line)?;

        if line.trim().is_empty() {
            return Err(DriverError::Protocol {
                command: request.name().into(),
                message: "empty response (process may have died)".into(),
            });
        }

        serde_json::from_str(line.trim()).map_err(|e| DriverError::Json {
            context: format!("{} response", request.name()),
            source: e,
        })
    }

    /// Send a request and verify it succeeded.
    fn send_ok(&mut self, request: &BrowserRequest<'_>) -> Result<BrowserResponse, DriverError> {
        let response = self.send(request)?;
        if !response.ok {
            return Err(response.into_error(request.name()));
        }
        Ok(response)
    }

    /// Last URL seen by this session, without asking the browser.
    pub fn last_url(&self) -> Option<&str> {
        self.current_url.as_deref()
    }

    pub fn config(&self) -> &DriverConfig {
        &self.config
    }

    /// Quit the browser session.
    pub fn quit(&mut self) -> Result<(), DriverError> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        // The process may already be gone.
        let _ = self.send(&BrowserRequest::Quit);
        self.child.wait()?;
        Ok(())
    }
}

impl Driver for BrowserSession {
    fn snapshot(&mut self) -> Result<Vec<RawElement>, DriverError> {
        let markers = self.config.marker_attributes.clone();
        let response = self.send_ok(&BrowserRequest::Snapshot {
            marker_attributes: &markers,
        })?;
        response.elements.ok_or_else(|| DriverError::Protocol {
            command: "snapshot".into(),
            message: "no elements in snapshot response".into(),
        })
    }

    fn refresh(&mut self, handle: &ElementHandle) -> Result<Option<RawElement>, DriverError> {
        let markers = self.config.marker_attributes.clone();
        let request = BrowserRequest::Refresh {
            handle: handle.as_str(),
            marker_attributes: &markers,
        };
        match self.send_ok(&request) {
            Ok(response) => Ok(response.element),
            Err(DriverError::StaleElement(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    fn click(&mut self, handle: &ElementHandle) -> Result<(), DriverError> {
        self.send_ok(&BrowserRequest::Click {
            handle: handle.as_str(),
        })?;
        Ok(())
    }

    fn set_value(&mut self, handle: &ElementHandle, value: &str) -> Result<(), DriverError> {
        self.send_ok(&BrowserRequest::SetValue {
            handle: handle.as_str(),
            value,
        })?;
        Ok(())
    }

    fn drag(&mut self, from: &ElementHandle, to: &ElementHandle) -> Result<(), DriverError> {
        self.send_ok(&BrowserRequest::Drag {
            from: from.as_str(),
            to: to.as_str(),
        })?;
        Ok(())
    }

    fn execute_script(
        &mut self,
        script: &str,
        handle: Option<&ElementHandle>,
    ) -> Result<Value, DriverError> {
        let response = self.send_ok(&BrowserRequest::Execute {
            script,
            handle: handle.map(ElementHandle::as_str),
        })?;
        Ok(response.value.unwrap_or(Value::Null))
    }

    fn navigate(&mut self, url: &str) -> Result<(), DriverError> {
        self.send_ok(&BrowserRequest::Navigate { url })?;
        self.current_url = Some(url.to_string());
        Ok(())
    }

    fn current_url(&mut self) -> Result<String, DriverError> {
        let response = self.send_ok(&BrowserRequest::CurrentUrl)?;
        let url = response.url.ok_or_else(|| DriverError::Protocol {
            command: "current_url".into(),
            message: "no URL in current_url response".into(),
        })?;
        self.current_url = Some(url.clone());
        Ok(url)
    }
}

impl Drop for BrowserSession {
    fn drop(&mut self) {
        if let Err(e) = self.quit() {
            warn!(error = %e, "browser session did not quit cleanly");
        }
    }
}
