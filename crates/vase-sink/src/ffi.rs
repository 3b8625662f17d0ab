//! C-ABI entry points for the instrumented native binary to call.
//!
//! The instrumentation pass (`vase-instrument`) inserts calls to these
//! symbols at conditional-branch sides and at function entry. Mirrors the
//! `patch_seq_*` FFI convention: never unwind across the boundary, never
//! abort the host program on a logging failure.

use std::ffi::{c_char, c_int, CStr};

use crate::{record, record_entry};

/// # Safety
/// `var` must be a valid, NUL-terminated C string for the duration of
/// the call.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn vase_record_branch_value(loc: u64, branch: c_int, var: *const c_char, val: i32) {
    let result = std::panic::catch_unwind(|| {
        let name = unsafe { c_str_to_str(var) };
        record(None, loc, branch, name, val);
    });
    if let Err(payload) = result {
        tracing::warn!(message = %format_panic_payload(&payload), "vase-sink: panic while recording branch value");
    }
}

/// # Safety
/// `var` must be a valid, NUL-terminated C string for the duration of
/// the call.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn vase_record_entry_arg(loc: u64, var: *const c_char, val: i32) {
    let result = std::panic::catch_unwind(|| {
        let name = unsafe { c_str_to_str(var) };
        record_entry(None, loc, name, val);
    });
    if let Err(payload) = result {
        tracing::warn!(message = %format_panic_payload(&payload), "vase-sink: panic while recording entry arg");
    }
}

unsafe fn c_str_to_str<'a>(ptr: *const c_char) -> &'a str {
    if ptr.is_null() {
        return "tmp_0";
    }
    unsafe { CStr::from_ptr(ptr) }.to_str().unwrap_or("tmp_0")
}

fn format_panic_payload(payload: &Box<dyn std::any::Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::CString;

    #[test]
    fn records_via_ffi_shim() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("log.txt");
        unsafe { std::env::set_var(crate::ENV_VAR, &path) };

        let name = CString::new("argc").unwrap();
        unsafe { vase_record_branch_value(42, 1, name.as_ptr(), 4) };

        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(contents, "loc:42:branch:1\targc:4\n");

        unsafe { std::env::remove_var(crate::ENV_VAR) };
    }

    #[test]
    fn null_var_name_falls_back_without_panicking() {
        unsafe { vase_record_branch_value(1, 0, std::ptr::null(), 0) };
    }
}
