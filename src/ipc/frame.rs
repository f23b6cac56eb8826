//! Length-prefixed framing: a 4-byte big-endian length, then the body.

use std::io::{self, Read, Write};

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

fn too_large(len: usize, max: usize) -> io::Error {
    io::Error::new(
        io::ErrorKind::InvalidData,
        format!("frame of {} bytes exceeds limit of {}", len, max),
    )
}

fn checked_len(len: usize, max: usize) -> io::Result<[u8; 4]> {
    if len > max {
        return Err(too_large(len, max));
    }
    let len = u32::try_from(len).map_err(|_| too_large(len, max))?;
    Ok(len.to_be_bytes())
}

/// Read one frame. Returns `None` on a clean end of stream.
pub async fn read_frame<R>(reader: &mut R, max: usize) -> io::Result<Option<Vec<u8>>>
where
    R: AsyncRead + Unpin,
{
    let mut header = [0u8; 4];
    match reader.read_exact(&mut header).await {
        Ok(_) => {}
        Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => return Ok(None),
        Err(e) => return Err(e),
    }
    let len = u32::from_be_bytes(header) as usize;
    if len > max {
        return Err(too_large(len, max));
    }
    let mut body = vec![0u8; len];
    reader.read_exact(&mut body).await?;
    Ok(Some(body))
}

pub async fn write_frame<W>(writer: &mut W, body: &[u8], max: usize) -> io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    let header = checked_len(body.len(), max)?;
    writer.write_all(&header).await?;
    writer.write_all(body).await?;
    writer.flush().await
}

/// Blocking variant of [`read_frame`] for synchronous clients.
pub fn read_frame_blocking<R: Read>(reader: &mut R, max: usize) -> io::Result<Vec<u8>> {
    let mut header = [0u8; 4];
    reader.read_exact(&mut header)?;
    let len = u32::from_be_bytes(header) as usize;
    if len > max {
        return Err(too_large(len, max));
    }
    let mut body = vec![0u8; len];
    reader.read_exact(&mut body)?;
    Ok(body)
}

/// Blocking variant of [`write_frame`].
pub fn write_frame_blocking<W: Write>(writer: &mut W, body: &[u8], max: usize) -> io::Result<()> {
    let header = checked_len(body.len(), max)?;
    writer.write_all(&header)?;
    writer.write_all(body)?;
    writer.flush()
}
