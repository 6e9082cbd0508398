//! Fixed-size, NUL-terminated byte strings.
//!
//! Copy lengths are computed from the source and the destination bound, never
//! written out by hand next to a literal.

/// The bytes before the first NUL, or the whole buffer when unterminated.
#[inline(always)]
pub fn until_nul(buf: &[u8]) -> &[u8] {
	match buf.iter().position(|&b| b == 0) {
		Some(len) => &buf[..len],
		None => buf,
	}
}

/// Copies `src` (up to its first NUL) into `dst`, truncating to `N - 1` bytes
/// and zero-filling the remainder. Returns the number of bytes copied.
#[inline(always)]
pub fn copy_str<const N: usize>(dst: &mut [u8; N], src: &[u8]) -> usize {
	if N == 0 {
		return 0;
	}

	let src = until_nul(src);
	let len = if src.len() < N { src.len() } else { N - 1 };

	dst[..len].copy_from_slice(&src[..len]);
	dst[len..].fill(0);

	len
}

// region:    --- Tests


// endregion: --- Tests
