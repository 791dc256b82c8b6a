use std::fmt;
use std::io::{self, BufWriter, Write};

use crate::config::OutputFormat;

/// 昇順の素数列を受け取る出力先。
pub trait PrimeSink {
    fn write_prime(&mut self, p: u64) -> io::Result<()>;
    fn finish(&mut self) -> io::Result<()>;
}

/// 任意の `Write`（標準出力・ファイルなど）に指定フォーマットで書き出す Writer。
pub struct StreamPrimeWriter<W: Write> {
    format: OutputFormat,
    writer: BufWriter<W>,
    started: bool,
    finished: bool,
    total_count: u64,
}

impl<W: Write> StreamPrimeWriter<W> {
    pub fn new(inner: W, format: OutputFormat, buf_size: usize) -> Self {
        Self {
            format,
            writer: BufWriter::with_capacity(buf_size.max(1), inner),
            started: false,
            finished: false,
            total_count: 0,
        }
    }

    /// これまでに書き込まれた素数の総数を返します。
    pub fn total_primes_written(&self) -> u64 {
        self.total_count
    }

    /// 書き出しを終えて内側の Writer を取り出す。
    pub fn into_inner(mut self) -> io::Result<W> {
        self.finish()?;
        self.writer.into_inner().map_err(|e| e.into_error())
    }

    fn start_if_needed(&mut self) -> io::Result<()> {
        if !self.started {
            if let OutputFormat::JSON = self.format {
                write!(self.writer, "[")?;
            }
            self.started = true;
        }
        Ok(())
    }
}

impl<W: Write> PrimeSink for StreamPrimeWriter<W> {
    fn write_prime(&mut self, p: u64) -> io::Result<()> {
        let first = !self.started;
        self.start_if_needed()?;

        match self.format {
            OutputFormat::Text => {
                writeln!(self.writer, "{p}")?;
            }
            OutputFormat::CSV => {
                writeln!(self.writer, "{p},")?;
            }
            OutputFormat::JSON => {
                if first {
                    write!(self.writer, "{p}")?;
                } else {
                    write!(self.writer, ",{p}")?;
                }
            }
            OutputFormat::Binary => {
                self.writer.write_all(&p.to_le_bytes())?;
            }
        }

        self.total_count += 1;
        Ok(())
    }

    fn finish(&mut self) -> io::Result<()> {
        if self.finished {
            return Ok(());
        }
        self.start_if_needed()?;
        if let OutputFormat::JSON = self.format {
            write!(self.writer, "]")?;
        }
        self.writer.flush()?;
        self.finished = true;
        Ok(())
    }
}

/// 件数と先頭・末尾の素数だけを記録し、何も書き出さない出力先。
///
/// 直前の値以下の素数を受け取った回数も数えるので、
/// 生成結果の並びを全件保持せずに確かめられる。
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SummarySink {
    count: u64,
    first: Option<u64>,
    last: Option<u64>,
    descents: u64,
}

impl SummarySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn first(&self) -> Option<u64> {
        self.first
    }

    pub fn last(&self) -> Option<u64> {
        self.last
    }

    /// 受け取った列が狭義単調増加だったか。
    pub fn is_strictly_ascending(&self) -> bool {
        self.descents == 0
    }
}

impl PrimeSink for SummarySink {
    fn write_prime(&mut self, p: u64) -> io::Result<()> {
        match self.last {
            Some(prev) if p <= prev => self.descents += 1,
            Some(_) => {}
            None => self.first = Some(p),
        }
        self.last = Some(p);
        self.count += 1;
        Ok(())
    }

    fn finish(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl fmt::Display for SummarySink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.first, self.last) {
            (Some(first), Some(last)) => {
                write!(f, "{} primes, first = {first}, last = {last}", self.count)
            }
            _ => write!(f, "0 primes"),
        }
    }
}

/// 素数列をすべて `sink` に書き出して閉じる。
pub fn emit_primes(primes: &[u64], sink: &mut dyn PrimeSink) -> io::Result<()> {
    for &p in primes {
        sink.write_prime(p)?;
    }
    sink.finish()
}
