use crate::error::{MrError, Result};
use crate::{Chunk, Document};

/// Split a document into chunks of at most `lines_per_chunk` lines each.
/// Line order and content are preserved; an empty document yields no chunks.
pub fn split_document(document: &Document, lines_per_chunk: usize) -> Result<Vec<Chunk>> {
    if lines_per_chunk == 0 {
        return Err(MrError::invalid("lines_per_chunk must be greater than 0"));
    }

    let lines = read_lines(&document.text);
    let chunks = lines
        .chunks(lines_per_chunk)
        .map(|lines| Chunk {
            document: document.id.clone(),
            contents: lines.join("\n"),
        })
        .collect();

    Ok(chunks)
}

/// Lines ended by `\n`, `\r` or `\r\n`. A trailing terminator does not start a new line.
fn read_lines(text: &str) -> Vec<&str> {
    let mut lines = Vec::new();
    let mut rest = text;
    while !rest.is_empty() {
        match rest.find(&['\n', '\r'][..]) {
            Some(end) => {
                lines.push(&rest[..end]);
                let terminator = if rest[end..].starts_with("\r\n") { 2 } else { 1 };
                rest = &rest[end + terminator..];
            }
            None => {
                lines.push(rest);
                break;
            }
        }
    }
    lines
}

/// Split every document, keeping document order and chunk order within a document
pub fn split_documents(documents: &[Document], lines_per_chunk: usize) -> Result<Vec<Chunk>> {
    let mut chunks = Vec::new();
    for document in documents {
        chunks.extend(split_document(document, lines_per_chunk)?);
    }
    Ok(chunks)
}
