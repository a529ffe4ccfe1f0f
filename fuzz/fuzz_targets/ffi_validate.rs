#![no_main]

use libfuzzer_sys::fuzz_target;
use safe_html_validator::ffi::*;
use std::ptr;

fuzz_target!(|data: &[u8]| {
    let handle = unsafe { safe_html_validator_new(ptr::null(), 0, ptr::null_mut()) };
    if handle.is_null() {
        return;
    }

    let mut result = SafeHtmlResult::default();
    unsafe {
        safe_html_validate(handle, data.as_ptr(), data.len(), ptr::null(), 0, &mut result);
    }
    assert!(result.valid <= 1);
    assert_eq!(result.error_code == ERROR_SUCCESS, result.error_message.is_null());

    unsafe {
        safe_html_result_free(&mut result);
        safe_html_validator_free(handle);
    }
});
