//! Exchange output filter.
//!
//! [`OutputFilter`] emits one line per completed exchange, laid out after the
//! Common Logfile Format:
//!
//! ```text
//! remotehost rfc931 authuser [date] "request" status bytes
//! 127.0.0.1 - - [22/Jun/2026:13:55:36 -0700] "GET /example.txt" 200 -
//! ```
//!
//! The `rfc931`, `authuser`, and `bytes` fields are not tracked and always
//! render as `-`. At [`OutputLevel::Verbose`], the summary line is followed
//! by every request header (prefixed `>`) and every response header
//! (prefixed `<`), each block closed by its prefix alone on a line.
//!
//! The filter runs strictly after the inner chain completes, because it
//! reports the final response status.

use std::fmt::Write as _;
use std::io::Write;
use std::net::IpAddr;
use std::str::FromStr;
use std::sync::Mutex;

use http::StatusCode;

use crate::error::{Error, Result};
use crate::exchange::Exchange;
use crate::filter::{Chain, Filter};
use crate::handler::BoxFuture;
use crate::headers::Headers;

/// How much output to produce per exchange.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputLevel {
    /// No output. Do not attach a filter at this level; omit it instead.
    None,
    /// One summary line per exchange.
    Default,
    /// The summary line plus full request and response header dumps.
    Verbose,
}

/// Parses the CLI-facing values `none`, `default`, and `verbose`.
/// Anything else is a configuration error.
impl FromStr for OutputLevel {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "none" => Ok(Self::None),
            "default" => Ok(Self::Default),
            "verbose" => Ok(Self::Verbose),
            other => Err(Error::config(format!("unrecognized output level `{other}`"))),
        }
    }
}

/// A [`Filter`] that logs each completed exchange to a caller-supplied sink.
pub struct OutputFilter {
    sink: Mutex<Box<dyn Write + Send>>,
    verbose: bool,
}

impl OutputFilter {
    /// Builds an output filter for `level`.
    ///
    /// Fails for [`OutputLevel::None`]: a no-op filter would still sit in the
    /// chain; callers wanting no output must not add one.
    pub fn new(sink: impl Write + Send + 'static, level: OutputLevel) -> Result<Self> {
        let verbose = match level {
            OutputLevel::None => {
                return Err(Error::config(
                    "output filter cannot be constructed at level `none`; omit the filter",
                ));
            }
            OutputLevel::Default => false,
            OutputLevel::Verbose => true,
        };
        Ok(Self { sink: Mutex::new(Box::new(sink)), verbose })
    }

    fn write_record(&self, exchange: &Exchange) {
        let mut record = summary_line(
            exchange.remote_addr().ip(),
            exchange.method().as_str(),
            exchange.request().target(),
            exchange.response_status(),
        );
        record.push('\n');
        if self.verbose {
            header_block(&mut record, '>', exchange.request_headers());
            let sent;
            let response_headers = match exchange.sent_response_headers() {
                Some(headers) => headers,
                None => {
                    sent = Headers::new();
                    &sent
                }
            };
            header_block(&mut record, '<', response_headers);
        }

        // One locked write per exchange keeps verbose blocks contiguous even
        // with many workers sharing the sink.
        let mut sink = self.sink.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Err(e) = sink.write_all(record.as_bytes()) {
            tracing::warn!("exchange log write failed: {e}");
        }
    }
}

impl Filter for OutputFilter {
    fn apply<'a>(&'a self, exchange: &'a mut Exchange, chain: Chain<'a>) -> BoxFuture<'a> {
        Box::pin(async move {
            chain.proceed(&mut *exchange).await?;
            self.write_record(exchange);
            Ok(())
        })
    }

    fn description(&self) -> &str {
        if self.verbose {
            "exchange output filter (verbose)"
        } else {
            "exchange output filter"
        }
    }
}

fn summary_line(remote: IpAddr, method: &str, target: &str, status: Option<StatusCode>) -> String {
    let timestamp = chrono::Local::now().format("%d/%b/%Y:%H:%M:%S %z");
    let status = match status {
        Some(code) => code.as_u16().to_string(),
        None => "-".to_owned(),
    };
    format!("{remote} - - [{timestamp}] \"{method} {target}\" {status} -")
}

fn header_block(out: &mut String, sign: char, headers: &Headers) {
    for (name, values) in headers.iter() {
        let _ = writeln!(out, "{sign} {name}: {}", values.join(" "));
    }
    let _ = writeln!(out, "{sign}");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_recognized_levels_and_rejects_the_rest() {
        assert_eq!("none".parse::<OutputLevel>().unwrap(), OutputLevel::None);
        assert_eq!("default".parse::<OutputLevel>().unwrap(), OutputLevel::Default);
        assert_eq!("verbose".parse::<OutputLevel>().unwrap(), OutputLevel::Verbose);
        assert!("quiet".parse::<OutputLevel>().is_err());
        assert!("DEFAULT".parse::<OutputLevel>().is_err());
    }

    #[test]
    fn construction_refuses_level_none() {
        assert!(OutputFilter::new(Vec::<u8>::new(), OutputLevel::None).is_err());
        assert!(OutputFilter::new(Vec::<u8>::new(), OutputLevel::Default).is_ok());
    }

    #[test]
    fn summary_line_renders_placeholders_as_dashes() {
        let line = summary_line(
            "127.0.0.1".parse().unwrap(),
            "GET",
            "/example.txt",
            Some(StatusCode::OK),
        );
        assert!(line.starts_with("127.0.0.1 - - ["));
        assert!(line.ends_with("\"GET /example.txt\" 200 -"));
    }

    #[test]
    fn summary_line_without_a_sent_status() {
        let line = summary_line("10.0.0.9".parse().unwrap(), "PUT", "/x", None);
        assert!(line.ends_with("\"PUT /x\" - -"));
    }

    #[test]
    fn header_block_joins_values_and_closes_with_bare_sign() {
        let mut b = Headers::builder();
        b.add("Accept", "text/html").add("Accept", "text/plain");
        b.add("Host", "example.com");
        let mut out = String::new();
        header_block(&mut out, '>', &b.freeze());
        assert_eq!(out, "> Accept: text/html text/plain\n> Host: example.com\n>\n");
    }

    #[test]
    fn descriptions_reflect_verbosity() {
        let plain = OutputFilter::new(Vec::<u8>::new(), OutputLevel::Default).unwrap();
        let verbose = OutputFilter::new(Vec::<u8>::new(), OutputLevel::Verbose).unwrap();
        assert_eq!(plain.description(), "exchange output filter");
        assert_eq!(verbose.description(), "exchange output filter (verbose)");
    }
}
