/// Clamps the buffer to the length the driver declared for it.
///
/// Every parser in this crate works on the returned slice only, so no
/// field access can reach past the declared length, whatever the buffer
/// holds beyond it.
pub fn declared(bytes: &[u8], length: usize) -> &[u8] {
    match bytes.get(..length) {
        Some(value) => value,
        None => bytes,
    }
}

/// Bounds-checked single byte access.
pub fn byte_at(bytes: &[u8], offset: usize) -> Option<u8> {
    bytes.get(offset).copied()
}

/// Bounds-checked sub-slice access: `length` bytes starting at `offset`.
pub fn slice_at(bytes: &[u8], offset: usize, length: usize) -> Option<&[u8]> {
    let end = offset.checked_add(length)?;
    bytes.get(offset..end)
}

pub enum ParserError {
    ErrorVerify,
    FailureVerify,
}

impl ParserError {
    pub fn to_nom<T>(&self, input: T) -> nom::Err<nom::error::Error<T>> {
        match self {
            Self::ErrorVerify => nom::Err::Error(nom::error::Error::new(
                input,
                nom::error::ErrorKind::Verify,
            )),
            Self::FailureVerify => nom::Err::Failure(nom::error::Error::new(
                input,
                nom::error::ErrorKind::Verify,
            )),
        }
    }
}
