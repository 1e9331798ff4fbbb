//! Line assembly across output chunks

/// Splits a byte stream into lines, holding back an unterminated tail
///
/// `\n`, `\r\n` and a lone `\r` terminate a line; the terminator is not
/// part of the line. Bytes are decoded per complete line, so a multi-byte
/// character split across two chunks is reassembled before decoding.
#[derive(Debug, Default)]
pub(crate) struct LineBuffer {
    pending: Vec<u8>,
    // last byte seen was `\r`; a `\n` right after it is part of the same terminator
    after_cr: bool,
}

impl LineBuffer {
    /// Appends bytes and emits every line completed by them
    pub(crate) fn push(&mut self, bytes: &[u8], mut emit: impl FnMut(&str)) {
        for &byte in bytes {
            if std::mem::take(&mut self.after_cr) && byte == b'\n' {
                continue;
            }
            match byte {
                b'\n' | b'\r' => {
                    emit(&decode_line(&self.pending));
                    self.pending.clear();
                    self.after_cr = byte == b'\r';
                }
                _ => self.pending.push(byte),
            }
        }
    }

    /// Emits the unterminated tail, if any
    pub(crate) fn flush(&mut self, mut emit: impl FnMut(&str)) {
        self.after_cr = false;
        if !self.pending.is_empty() {
            emit(&decode_line(&self.pending));
            self.pending.clear();
        }
    }

    #[cfg(test)]
    pub(crate) fn pending_len(&self) -> usize {
        self.pending.len()
    }
}

fn decode_line(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}
