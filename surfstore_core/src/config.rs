//! Parser for SurfStore's line-oriented configuration file format, shared
//! by the MetadataStore, the BlockStore servers, and the client.
//!
//! ```text
//! B: <N>
//! metadata: <host>: <port>
//! block<i>: <host>: <port>           # i = 1..N, one line each
//! ```
//!
//! Lines are parsed positionally (line 0 is `B:`, line 1 is `metadata:`,
//! lines 2..2+N are the `block<i>:` lines), the same way the original
//! reference implementation parses it. Whitespace around every
//! colon-separated value is trimmed.

use std::path::Path;

/// A `host:port` pair, kept as its two parts rather than a resolved
/// `SocketAddr` since the host may be a DNS name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    pub host: String,
    pub port: u16,
}

impl Endpoint {
    /// The string form accepted by `TcpStream::connect`/`TcpListener::bind`.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Number of configured BlockStore instances.
    pub n_blocks: usize,
    pub metadata: Endpoint,
    /// `block_stores[i]` is the endpoint for `block<i+1>:` in the file.
    pub block_stores: Vec<Endpoint>,
}

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("could not read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("config file has {got} lines, expected at least {expected}")]
    TooFewLines { expected: usize, got: usize },
    #[error("malformed line {line_no} ({line:?}): expected at least {expected_parts} colon-separated parts")]
    MalformedLine {
        line_no: usize,
        line: String,
        expected_parts: usize,
    },
    #[error("invalid block count on line 0 ({line:?}): {source}")]
    InvalidBlockCount {
        line: String,
        #[source]
        source: std::num::ParseIntError,
    },
    #[error("invalid port on line {line_no} ({line:?}): {source}")]
    InvalidPort {
        line_no: usize,
        line: String,
        #[source]
        source: std::num::ParseIntError,
    },
}

impl Config {
    pub fn parse(contents: &str) -> Result<Self, ConfigError> {
        let lines: Vec<&str> = contents.lines().collect();

        let n_blocks = parse_count_line(&lines, 0)?;
        if lines.len() < 2 + n_blocks {
            return Err(ConfigError::TooFewLines {
                expected: 2 + n_blocks,
                got: lines.len(),
            });
        }

        let metadata = parse_endpoint_line(&lines, 1)?;

        let mut block_stores = Vec::with_capacity(n_blocks);
        for i in 0..n_blocks {
            block_stores.push(parse_endpoint_line(&lines, 2 + i)?);
        }

        Ok(Config {
            n_blocks,
            metadata,
            block_stores,
        })
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::parse(&contents)
    }
}

fn parse_count_line(lines: &[&str], line_no: usize) -> Result<usize, ConfigError> {
    let line = *lines
        .get(line_no)
        .ok_or(ConfigError::TooFewLines {
            expected: line_no + 1,
            got: lines.len(),
        })?;
    let parts: Vec<&str> = line.splitn(2, ':').collect();
    if parts.len() != 2 {
        return Err(ConfigError::MalformedLine {
            line_no,
            line: line.to_string(),
            expected_parts: 2,
        });
    }
    parts[1]
        .trim()
        .parse::<usize>()
        .map_err(|source| ConfigError::InvalidBlockCount {
            line: line.to_string(),
            source,
        })
}

fn parse_endpoint_line(lines: &[&str], line_no: usize) -> Result<Endpoint, ConfigError> {
    let line = lines[line_no];
    let parts: Vec<&str> = line.splitn(3, ':').collect();
    if parts.len() != 3 {
        return Err(ConfigError::MalformedLine {
            line_no,
            line: line.to_string(),
            expected_parts: 3,
        });
    }
    let host = parts[1].trim().to_string();
    let port = parts[2]
        .trim()
        .parse::<u16>()
        .map_err(|source| ConfigError::InvalidPort {
            line_no,
            line: line.to_string(),
            source,
        })?;
    Ok(Endpoint { host, port })
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "B: 2\nmetadata: 127.0.0.1: 8081\nblock1: 127.0.0.1: 8082\nblock2: 127.0.0.1: 8083\n";

    #[test]
    fn parses_well_formed_config() {
        let config = Config::parse(SAMPLE).unwrap();
        assert_eq!(config.n_blocks, 2);
        assert_eq!(config.metadata.host, "127.0.0.1");
        assert_eq!(config.metadata.port, 8081);
        assert_eq!(config.block_stores.len(), 2);
        assert_eq!(config.block_stores[0].port, 8082);
        assert_eq!(config.block_stores[1].port, 8083);
    }

    #[test]
    fn trims_whitespace_around_values() {
        let sample = "B:   3  \nmetadata:   host.example  :  9000  \nblock1:  a  :1\nblock2: b :2\nblock3: c :3\n";
        let config = Config::parse(sample).unwrap();
        assert_eq!(config.metadata.host, "host.example");
        assert_eq!(config.metadata.port, 9000);
        assert_eq!(config.block_stores[0].host, "a");
    }

    #[test]
    fn rejects_too_few_block_lines() {
        let sample = "B: 3\nmetadata: h: 1\nblock1: h: 2\n";
        assert!(matches!(
            Config::parse(sample),
            Err(ConfigError::TooFewLines { .. })
        ));
    }

    #[test]
    fn rejects_non_numeric_block_count() {
        let sample = "B: many\nmetadata: h: 1\n";
        assert!(matches!(
            Config::parse(sample),
            Err(ConfigError::InvalidBlockCount { .. })
        ));
    }

    #[test]
    fn rejects_non_numeric_port() {
        let sample = "B: 1\nmetadata: h: 1\nblock1: h: notaport\n";
        assert!(matches!(
            Config::parse(sample),
            Err(ConfigError::InvalidPort { .. })
        ));
    }

    #[test]
    fn endpoint_addr_formats_as_host_colon_port() {
        let ep = Endpoint {
            host: "example.com".to_string(),
            port: 1234,
        };
        assert_eq!(ep.addr(), "example.com:1234");
    }
}
