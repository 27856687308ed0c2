use std::io::{self, Write};

use async_trait::async_trait;
use forgeyt_core::Terminal;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader, Stdin};

/// Prompts on `out`, reads answers line by line from `input`.
pub struct LineTerminal<R, W, E> {
    input: R,
    out: W,
    err: E,
}

pub type StdioTerminal = LineTerminal<BufReader<Stdin>, io::Stdout, io::Stderr>;

impl StdioTerminal {
    pub fn stdio() -> Self {
        LineTerminal::new(
            BufReader::new(tokio::io::stdin()),
            io::stdout(),
            io::stderr(),
        )
    }
}

impl<R, W, E> LineTerminal<R, W, E>
where
    R: AsyncBufRead + Unpin,
{
    pub fn new(input: R, out: W, err: E) -> Self {
        Self {
            input,
            out,
            err,
        }
    }
}

#[async_trait]
impl<R, W, E> Terminal for LineTerminal<R, W, E>
where
    R: AsyncBufRead + Unpin + Send,
    W: Write + Send,
    E: Write + Send,
{
    async fn prompt(&mut self, question: &str) -> io::Result<Option<String>> {
        write!(self.out, "{question}")?;
        self.out.flush()?;
        let mut raw = Vec::new();
        if self.input.read_until(b'\n', &mut raw).await? == 0 {
            return Ok(None);
        }
        // Answers are compared literally, so stray whitespace and `\r` go.
        let answer = String::from_utf8_lossy(&raw);
        Ok(Some(answer.trim().to_string()))
    }

    fn print(&mut self, line: &str) -> io::Result<()> {
        writeln!(self.out, "{line}")?;
        self.out.flush()
    }

    fn warn(&mut self, line: &str) -> io::Result<()> {
        self.out.flush()?;
        writeln!(self.err, "{line}")?;
        self.err.flush()
    }
}
