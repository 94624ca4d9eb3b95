//! FTP control-channel replies.
//!
//! A reply is a three-digit code and text. Multi-line replies open with
//! `NNN-` and end at the first line starting with the same code and a space.

use ftpvfs::{TransportError, TransportResult};
use std::net::Ipv4Addr;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};

/// A complete server reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub code: u16,
    /// Text of each line, without the code prefix.
    pub lines: Vec<String>,
}

impl Reply {
    /// All text lines joined with newlines.
    pub fn message(&self) -> String {
        self.lines.join("\n")
    }

    /// 1xx: the command was accepted and more replies will follow.
    pub fn is_preliminary(&self) -> bool {
        (100..200).contains(&self.code)
    }

    /// 2xx: the command completed.
    pub fn is_completion(&self) -> bool {
        (200..300).contains(&self.code)
    }

    /// Pass the reply through if its code is one of `codes`.
    pub fn expect(self, codes: &[u16]) -> TransportResult<Reply> {
        if codes.contains(&self.code) {
            Ok(self)
        } else {
            Err(self.into_error())
        }
    }

    /// The reply as a rejection.
    pub fn into_error(self) -> TransportError {
        let message = self.message();
        TransportError::rejected(self.code, message)
    }
}

/// Read one complete reply.
pub async fn read_reply<R: AsyncBufRead + Unpin>(reader: &mut R) -> TransportResult<Reply> {
    let first = read_line(reader).await?;
    let (code, multiline, text) = split_code(&first)?;
    let mut lines = vec![text.to_string()];

    if multiline {
        let terminator = format!("{} ", code);
        loop {
            let line = read_line(reader).await?;
            if let Some(text) = line.strip_prefix(&terminator) {
                lines.push(text.to_string());
                break;
            }
            if line == code.to_string() {
                break;
            }
            lines.push(line);
        }
    }

    Ok(Reply { code, lines })
}

async fn read_line<R: AsyncBufRead + Unpin>(reader: &mut R) -> TransportResult<String> {
    let mut line = String::new();
    let n = reader.read_line(&mut line).await?;
    if n == 0 {
        return Err(std::io::Error::new(
            std::io::ErrorKind::UnexpectedEof,
            "control connection closed by server",
        )
        .into());
    }
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

/// Split `NNN text` / `NNN-text` into code, multi-line flag and text.
fn split_code(line: &str) -> TransportResult<(u16, bool, &str)> {
    let bytes = line.as_bytes();
    if bytes.len() < 3 || !bytes[..3].iter().all(u8::is_ascii_digit) {
        return Err(TransportError::protocol(format!("malformed reply: {:?}", line)));
    }
    let code: u16 = line[..3]
        .parse()
        .map_err(|_| TransportError::protocol(format!("malformed reply code: {:?}", line)))?;

    match bytes.get(3) {
        None => Ok((code, false, "")),
        Some(b' ') => Ok((code, false, &line[4..])),
        Some(b'-') => Ok((code, true, &line[4..])),
        Some(_) => Err(TransportError::protocol(format!("malformed reply: {:?}", line))),
    }
}

/// Port from a `229 Entering Extended Passive Mode (|||port|)` reply.
pub fn parse_epsv(message: &str) -> TransportResult<u16> {
    let malformed = || TransportError::protocol(format!("malformed EPSV reply: {:?}", message));

    let open = message.find('(').ok_or_else(malformed)?;
    let close = message[open..].find(')').ok_or_else(malformed)? + open;
    let inner = &message[open + 1..close];

    let delim = inner.chars().next().ok_or_else(malformed)?;
    let fields: Vec<&str> = inner.split(delim).collect();
    // "|||6446|" splits into ["", "", "", "6446", ""]
    if fields.len() != 5 {
        return Err(malformed());
    }
    fields[3].parse().map_err(|_| malformed())
}

/// Address and port from a `227 Entering Passive Mode (h1,h2,h3,h4,p1,p2)` reply.
///
/// Parentheses are optional; some servers omit them.
pub fn parse_pasv(message: &str) -> TransportResult<(Ipv4Addr, u16)> {
    let malformed = || TransportError::protocol(format!("malformed PASV reply: {:?}", message));

    let start = message.find(|c: char| c.is_ascii_digit()).ok_or_else(malformed)?;
    let numbers: String = message[start..]
        .chars()
        .take_while(|c| c.is_ascii_digit() || *c == ',')
        .collect();

    let parts = numbers
        .split(',')
        .map(|p| p.parse::<u8>())
        .collect::<Result<Vec<_>, _>>()
        .map_err(|_| malformed())?;
    let &[h1, h2, h3, h4, p1, p2] = parts.as_slice() else {
        return Err(malformed());
    };

    Ok((
        Ipv4Addr::new(h1, h2, h3, h4),
        (u16::from(p1) << 8) | u16::from(p2),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::BufReader;

    async fn parse(raw: &str) -> TransportResult<Reply> {
        let mut reader = BufReader::new(raw.as_bytes());
        read_reply(&mut reader).await
    }

    #[tokio::test]
    async fn test_single_line_reply() {
        let reply = parse("220 Service ready\r\n").await.unwrap();
        assert_eq!(reply.code, 220);
        assert_eq!(reply.message(), "Service ready");
        assert!(reply.is_completion());
    }

    #[tokio::test]
    async fn test_multi_line_reply() {
        let raw = "230-Welcome\r\n  to the archive\r\n230-still going\r\n230 Login ok\r\n";
        let reply = parse(raw).await.unwrap();
        assert_eq!(reply.code, 230);
        assert_eq!(
            reply.lines,
            vec!["Welcome", "  to the archive", "230-still going", "Login ok"]
        );
    }

    #[tokio::test]
    async fn test_bare_code() {
        let reply = parse("200\r\n").await.unwrap();
        assert_eq!(reply.code, 200);
        assert_eq!(reply.message(), "");
    }

    #[tokio::test]
    async fn test_sequential_replies_share_reader() {
        let mut reader = BufReader::new("150 Opening\r\n226 Done\r\n".as_bytes());
        let first = read_reply(&mut reader).await.unwrap();
        let second = read_reply(&mut reader).await.unwrap();
        assert!(first.is_preliminary());
        assert_eq!(second.code, 226);
    }

    #[tokio::test]
    async fn test_malformed_reply() {
        assert!(matches!(
            parse("hello\r\n").await,
            Err(TransportError::Protocol(_))
        ));
        assert!(matches!(
            parse("2x0 nope\r\n").await,
            Err(TransportError::Protocol(_))
        ));
    }

    #[tokio::test]
    async fn test_eof_is_io_error() {
        match parse("").await {
            Err(TransportError::Io(e)) => assert_eq!(e.kind(), std::io::ErrorKind::UnexpectedEof),
            other => panic!("expected EOF, got {:?}", other),
        }
    }

    #[test]
    fn test_expect() {
        let reply = Reply {
            code: 550,
            lines: vec!["No such file".into()],
        };
        assert_eq!(reply.clone().expect(&[550]).unwrap().code, 550);
        match reply.expect(&[250]) {
            Err(TransportError::Rejected { code, message }) => {
                assert_eq!(code, 550);
                assert_eq!(message, "No such file");
            }
            other => panic!("expected rejection, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_epsv() {
        assert_eq!(
            parse_epsv("Entering Extended Passive Mode (|||6446|)").unwrap(),
            6446
        );
        assert_eq!(parse_epsv("Extended Passive (!!!2121!)").unwrap(), 2121);
        assert!(parse_epsv("Entering Extended Passive Mode").is_err());
        assert!(parse_epsv("(|||port|)").is_err());
    }

    #[test]
    fn test_parse_pasv() {
        let (ip, port) = parse_pasv("Entering Passive Mode (192,168,1,2,19,178)").unwrap();
        assert_eq!(ip, Ipv4Addr::new(192, 168, 1, 2));
        assert_eq!(port, 19 * 256 + 178);

        let (ip, port) = parse_pasv("Entering Passive Mode 10,0,0,1,0,21").unwrap();
        assert_eq!(ip, Ipv4Addr::new(10, 0, 0, 1));
        assert_eq!(port, 21);

        assert!(parse_pasv("Entering Passive Mode (1,2,3)").is_err());
        assert!(parse_pasv("Entering Passive Mode (300,1,1,1,1,1)").is_err());
    }
}
