//! HDU scanning over a seekable FITS stream.

use crate::errors::{FitsError, Result};
use crate::header::{Header, BLOCK_SIZE, CARD_SIZE};
use crate::table::BinTable;
use std::fs::File;
use std::io::{BufReader, Read, Seek, SeekFrom};
use std::path::Path;

const MAX_HEADER_BLOCKS: usize = 1000;

#[derive(Debug, Clone)]
pub struct HduInfo {
    pub index: usize,
    pub header_start: u64,
    pub header_size: usize,
    pub data_start: u64,
    pub data_size: usize,
}

#[derive(Debug)]
pub struct FitsFile<R> {
    reader: R,
    hdus: Vec<HduInfo>,
    headers: Vec<Header>,
}

impl FitsFile<BufReader<File>> {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        Self::new(BufReader::new(file))
    }
}

impl<R: Read + Seek> FitsFile<R> {
    pub fn new(mut reader: R) -> Result<Self> {
        let stream_len = reader.seek(SeekFrom::End(0))?;
        let mut hdus = Vec::new();
        let mut headers = Vec::new();
        let mut position = 0u64;

        while position + BLOCK_SIZE as u64 <= stream_len {
            if !hdus.is_empty() && looks_like_padding(&mut reader, position)? {
                break;
            }
            let index = hdus.len();
            let (info, header) = scan_hdu(&mut reader, position, index)?;
            if index == 0 && !header.is_primary() {
                return Err(FitsError::InvalidFormat(
                    "first HDU must be a primary HDU".to_string(),
                ));
            }
            if index > 0 && !header.is_extension() {
                return Err(FitsError::InvalidFormat(
                    "non-primary HDUs must be extensions".to_string(),
                ));
            }
            position = align_to_block(info.data_start + info.data_size as u64);
            hdus.push(info);
            headers.push(header);
        }

        if hdus.is_empty() {
            return Err(FitsError::InvalidFormat(
                "stream too short for a FITS primary HDU".to_string(),
            ));
        }
        Ok(Self {
            reader,
            hdus,
            headers,
        })
    }

    pub fn num_hdus(&self) -> usize {
        self.hdus.len()
    }

    pub fn hdu_info(&self, index: usize) -> Option<&HduInfo> {
        self.hdus.get(index)
    }

    pub fn header(&self, index: usize) -> Result<&Header> {
        self.headers.get(index).ok_or(FitsError::HduNotFound(index))
    }

    /// Reads the raw data area of an HDU, without block padding.
    pub fn read_data(&mut self, index: usize) -> Result<Vec<u8>> {
        let info = self
            .hdus
            .get(index)
            .ok_or(FitsError::HduNotFound(index))?
            .clone();
        self.reader.seek(SeekFrom::Start(info.data_start))?;
        let mut data = vec![0u8; info.data_size];
        self.reader.read_exact(&mut data)?;
        Ok(data)
    }

    /// Materializes the binary-table extension at `index`.
    pub fn table_at(&mut self, index: usize) -> Result<BinTable> {
        let header = self.header(index)?;
        let xtension = header
            .get_keyword_value("XTENSION")
            .and_then(|v| v.as_text());
        if xtension != Some("BINTABLE") {
            return Err(FitsError::InvalidFormat(format!(
                "HDU {index} is not a BINTABLE extension"
            )));
        }
        let header = header.clone();
        let data = self.read_data(index)?;
        BinTable::from_parts(&header, data)
    }

    /// Materializes the first binary-table extension in the file, which is
    /// where survey strategy and statistics tables live.
    pub fn first_table(&mut self) -> Result<BinTable> {
        let index = self
            .headers
            .iter()
            .position(|h| {
                h.get_keyword_value("XTENSION").and_then(|v| v.as_text()) == Some("BINTABLE")
            })
            .ok_or(FitsError::NoTableExtension)?;
        self.table_at(index)
    }
}

fn looks_like_padding<R: Read + Seek>(reader: &mut R, position: u64) -> Result<bool> {
    reader.seek(SeekFrom::Start(position))?;
    let mut probe = [0u8; 8];
    if reader.read_exact(&mut probe).is_err() {
        return Ok(true);
    }
    Ok(probe.iter().all(|&b| b == 0 || b == b' '))
}

fn scan_hdu<R: Read + Seek>(
    reader: &mut R,
    position: u64,
    index: usize,
) -> Result<(HduInfo, Header)> {
    let header_size = determine_header_size(reader, position)?;
    reader.seek(SeekFrom::Start(position))?;
    let mut header_bytes = vec![0u8; header_size];
    reader.read_exact(&mut header_bytes)?;
    let header = Header::parse(&header_bytes)?;

    let data_start = position + header_size as u64;
    let data_size = data_size(&header)?;
    Ok((
        HduInfo {
            index,
            header_start: position,
            header_size,
            data_start,
            data_size,
        },
        header,
    ))
}

fn determine_header_size<R: Read + Seek>(reader: &mut R, start: u64) -> Result<usize> {
    reader.seek(SeekFrom::Start(start))?;
    let mut block = vec![0u8; BLOCK_SIZE];
    let mut blocks_read = 0;
    loop {
        if blocks_read >= MAX_HEADER_BLOCKS {
            return Err(FitsError::InvalidFormat(format!(
                "header exceeds {MAX_HEADER_BLOCKS} blocks"
            )));
        }
        reader.read_exact(&mut block).map_err(|e| {
            FitsError::InvalidFormat(format!(
                "unexpected end of file while scanning header at block {blocks_read}: {e}"
            ))
        })?;
        blocks_read += 1;
        for card in block.chunks_exact(CARD_SIZE) {
            let keyword = std::str::from_utf8(&card[0..8])
                .map_err(|_| FitsError::InvalidFormat("non-UTF-8 header card".to_string()))?;
            if keyword.trim() == "END" {
                return Ok(blocks_read * BLOCK_SIZE);
            }
        }
    }
}

fn data_size(header: &Header) -> Result<usize> {
    let naxis = header.integer("NAXIS").unwrap_or(0) as usize;
    if naxis == 0 {
        return Ok(0);
    }
    let bitpix = header
        .integer("BITPIX")
        .ok_or_else(|| FitsError::KeywordNotFound {
            keyword: "BITPIX".to_string(),
        })?;
    let bytes_per_element = match bitpix {
        8 | -8 => 1,
        16 => 2,
        32 | -32 => 4,
        64 | -64 => 8,
        other => {
            return Err(FitsError::InvalidFormat(format!(
                "invalid BITPIX value: {other}"
            )))
        }
    };
    let mut elements = 1usize;
    for i in 1..=naxis {
        let axis = header.integer(&format!("NAXIS{i}")).unwrap_or(1);
        if axis < 0 {
            return Err(FitsError::InvalidFormat(format!(
                "negative NAXIS{i}: {axis}"
            )));
        }
        elements = elements
            .checked_mul(axis as usize)
            .ok_or_else(|| FitsError::InvalidFormat("data dimensions too large".to_string()))?;
    }
    let pcount = header.integer("PCOUNT").unwrap_or(0).max(0) as usize;
    Ok(elements * bytes_per_element + pcount)
}

fn align_to_block(size: u64) -> u64 {
    size.div_ceil(BLOCK_SIZE as u64) * BLOCK_SIZE as u64
}
