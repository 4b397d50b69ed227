//! TLS record buffers in main SRAM
//!
//! `embedded-tls` needs a read buffer big enough for a full TLS 1.3 record
//! and a write buffer for outgoing records. They are far too large for the
//! task stack, so they live in statics and are handed out exactly once, to
//! the connector that owns the reporter's transport.
//!
//! # Buffer Sizing
//!
//! **Read Buffer (18 KB)**:
//! - TLS 1.3 maximum plaintext: 16384 bytes
//! - TLS record header: 5 bytes
//! - AEAD authentication tag: 16 bytes (AES-128-GCM-SHA256)
//! - Padding allowance: ~512 bytes
//!
//! **Write Buffer (16 KB)**:
//! - We control outgoing record sizes; a report is a few hundred bytes

#![allow(unsafe_code)] // Required for static mut buffers
#![deny(warnings)]

use core::sync::atomic::{AtomicBool, Ordering};

/// TLS read buffer size: 18 KB
const TLS_READ_BUF_SIZE: usize = 18 * 1024;

/// TLS write buffer size: 16 KB
const TLS_WRITE_BUF_SIZE: usize = 16 * 1024;

static mut TLS_READ_BUF: [u8; TLS_READ_BUF_SIZE] = [0; TLS_READ_BUF_SIZE];

static mut TLS_WRITE_BUF: [u8; TLS_WRITE_BUF_SIZE] = [0; TLS_WRITE_BUF_SIZE];

static TAKEN: AtomicBool = AtomicBool::new(false);

/// Exclusive handle on both TLS buffers
pub struct TlsBuffers {
    pub read: &'static mut [u8],
    pub write: &'static mut [u8],
}

/// Take both TLS buffers
///
/// Returns `None` on every call after the first.
pub fn take() -> Option<TlsBuffers> {
    if TAKEN.swap(true, Ordering::AcqRel) {
        return None;
    }

    // SAFETY: TAKEN guarantees this branch runs at most once, so the two
    // mutable references are the only ones ever created.
    let (read, write) = unsafe {
        (
            &mut *core::ptr::addr_of_mut!(TLS_READ_BUF),
            &mut *core::ptr::addr_of_mut!(TLS_WRITE_BUF),
        )
    };

    Some(TlsBuffers {
        read: read.as_mut_slice(),
        write: write.as_mut_slice(),
    })
}
