use bzip2::read::MultiBzDecoder;
use flate2::read::MultiGzDecoder;
use gzp::{deflate::Gzip, Compression, ZBuilder, ZWriter};
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Read};
use std::path::Path;

use super::error::{HexSgeError, Result};
use super::fs::{is_bzipped, is_gzipped};

const READ_BUFFER: usize = 256 * 1024;
const WRITE_BUFFER: usize = 1 << 20;

/// Compression of a text input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoding {
    Plain,
    Gzip,
    Bzip2,
}

impl Encoding {
    pub const ALL: [Encoding; 3] = [Encoding::Gzip, Encoding::Plain, Encoding::Bzip2];

    /// Guess from the file extension.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();
        if is_gzipped(path) {
            Encoding::Gzip
        } else if is_bzipped(path) {
            Encoding::Bzip2
        } else {
            Encoding::Plain
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Encoding::Plain => "plain text",
            Encoding::Gzip => "gzip",
            Encoding::Bzip2 => "bzip2",
        }
    }
}

/// Open a text source, decoding gzip (including multi-member/BGZF streams) or bzip2.
pub fn open_text<P: AsRef<Path>>(path: P, encoding: Encoding) -> Result<Box<dyn BufRead>> {
    let file = File::open(path.as_ref())?;
    let reader: Box<dyn BufRead> = match encoding {
        Encoding::Gzip => Box::new(BufReader::with_capacity(
            READ_BUFFER,
            MultiGzDecoder::new(BufReader::new(file)),
        )),
        Encoding::Bzip2 => Box::new(BufReader::with_capacity(
            READ_BUFFER,
            MultiBzDecoder::new(BufReader::new(file)),
        )),
        Encoding::Plain => Box::new(BufReader::with_capacity(READ_BUFFER, file)),
    };
    Ok(reader)
}

/// Build a tab-delimited CSV reader over a plain or compressed source.
pub fn get_reader<P: AsRef<Path>>(
    path: P,
    has_headers: bool,
    encoding: Encoding,
) -> Result<csv::Reader<Box<dyn Read>>> {
    let raw_reader: Box<dyn Read> = open_text(path, encoding)?;
    Ok(csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(has_headers)
        .flexible(true)
        .from_reader(raw_reader))
}

/// Create a gzip writer for `file`; more than one thread switches to block-parallel compression.
pub fn gz_writer(file: File, threads: usize, compression_level: u32) -> Box<dyn ZWriter> {
    ZBuilder::<Gzip, _>::new()
        .num_threads(threads)
        .compression_level(Compression::new(compression_level))
        .from_writer(BufWriter::with_capacity(WRITE_BUFFER, file))
}

/// Build a tab-delimited CSV writer targeting a gzip file.
///
/// Finish it with [`finish_writer`] so the gzip trailer is written before the handle closes.
pub fn get_writer<P: AsRef<Path>>(
    path: P,
    write_headers: bool,
    threads: usize,
    compression_level: u32,
) -> Result<csv::Writer<Box<dyn ZWriter>>> {
    let file = File::create(path.as_ref())?;
    Ok(csv::WriterBuilder::new()
        .delimiter(b'\t')
        .has_headers(write_headers)
        .from_writer(gz_writer(file, threads, compression_level)))
}

/// Flush a writer from [`get_writer`] and finalize its gzip stream.
pub fn finish_writer(writer: csv::Writer<Box<dyn ZWriter>>) -> Result<()> {
    let mut inner = writer
        .into_inner()
        .map_err(|err| HexSgeError::Io(err.into_error()))?;
    inner.finish()?;
    Ok(())
}
