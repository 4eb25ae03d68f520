// framecv-host/src/ffi.rs
// ------------------------------------------------------------
// Host binding.  The host owns the pixel memory and calls
//   doOpenCvTask(addr, width, height, parameter)
// once per frame.  A C call cannot carry a handle, so the
// installed processor lives in a per-thread slot; the host is
// single-threaded and always calls from the same thread.
// ------------------------------------------------------------

use crate::{FrameSink, ProcessError, Result};
use framecv_frame::{rgba_len, FrameError, FrameView};
use log::{debug, warn};
use std::cell::RefCell;

thread_local! {
    static SESSION: RefCell<Option<Box<dyn FrameSink>>> = const { RefCell::new(None) };
}

/// Make `sink` the target of `doOpenCvTask` on this thread.  Returns the
/// previously installed sink, if any.
///
/// # Panics
/// If called from inside the installed sink.
pub fn install(sink: impl FrameSink + 'static) -> Option<Box<dyn FrameSink>> {
    debug!("frame sink installed");
    SESSION.with(|slot| slot.borrow_mut().replace(Box::new(sink)))
}

/// Take the installed sink back out.
///
/// # Panics
/// If called from inside the installed sink.
pub fn uninstall() -> Option<Box<dyn FrameSink>> {
    SESSION.with(|slot| slot.borrow_mut().take())
}

/// Run `f` against the installed sink.  `None` if nothing is installed or
/// the sink is already in use further up the stack.
pub fn with_session<R>(f: impl FnOnce(&mut dyn FrameSink) -> R) -> Option<R> {
    SESSION.with(|slot| {
        let mut slot = slot.try_borrow_mut().ok()?;
        slot.as_mut().map(|sink| f(sink.as_mut()))
    })
}

fn dimension(v: i32) -> u32 {
    u32::try_from(v).unwrap_or(0)
}

/// # Safety
/// `addr` must point to `len` readable bytes (or `width*height*4` when `len`
/// is `None`) for the duration of the call.
unsafe fn submit_raw(addr: usize, len: Option<usize>, width: i32, height: i32, parameter: i32) -> Result<()> {
    let (w, h) = (dimension(width), dimension(height));
    if w == 0 || h == 0 {
        return Err(FrameError::EmptyFrame { width: w, height: h }.into());
    }
    let len = match len {
        Some(len) => len,
        None => rgba_len(w, h)?,
    };
    let frame = FrameView::from_raw(addr, len, w, h)?;

    SESSION.with(|slot| {
        // a sink calling back into the export must not panic across extern "C"
        let mut slot = slot.try_borrow_mut().map_err(|_| ProcessError::Busy)?;
        let sink = slot.as_mut().ok_or(ProcessError::NotInstalled)?;
        sink.submit(frame, parameter)
    })
}

fn report(result: Result<()>) {
    if let Err(e) = result {
        warn!("frame dropped: {e}");
    }
}

/// Process one RGBA frame at `addr` and present it.  Errors are logged and
/// swallowed; the host gets no status back.
///
/// # Safety
/// `addr` must point to `width * height * 4` readable bytes that stay valid
/// until the call returns.
#[no_mangle]
#[allow(non_snake_case)]
pub unsafe extern "C" fn doOpenCvTask(addr: usize, width: i32, height: i32, parameter: i32) {
    report(submit_raw(addr, None, width, height, parameter));
}

/// Like [`doOpenCvTask`] but with the buffer's byte length, which must equal
/// `width * height * 4`.
///
/// # Safety
/// `addr` must point to `len` readable bytes that stay valid until the call
/// returns.
#[no_mangle]
#[allow(non_snake_case)]
pub unsafe extern "C" fn doOpenCvTaskWithLen(addr: usize, len: usize, width: i32, height: i32, parameter: i32) {
    report(submit_raw(addr, Some(len), width, height, parameter));
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::rc::Rc;

    #[derive(Debug, PartialEq)]
    struct Call {
        width: u32,
        height: u32,
        param: i32,
        first: [u8; 4],
    }

    #[derive(Clone, Default)]
    struct Recorder {
        calls: Rc<RefCell<Vec<Call>>>,
    }

    impl FrameSink for Recorder {
        fn submit(&mut self, frame: FrameView<'_>, param: i32) -> Result<()> {
            let b = frame.as_bytes();
            self.calls.borrow_mut().push(Call {
                width: frame.width(),
                height: frame.height(),
                param,
                first: [b[0], b[1], b[2], b[3]],
            });
            Ok(())
        }
    }

    #[test]
    fn forwards_frame_to_installed_sink() {
        let recorder = Recorder::default();
        let calls = recorder.calls.clone();
        assert!(install(recorder).is_none());

        let data: Vec<u8> = (0..3 * 2 * 4).map(|i| i as u8).collect();
        unsafe { doOpenCvTask(data.as_ptr() as usize, 3, 2, 42) };

        assert_eq!(
            *calls.borrow(),
            vec![Call { width: 3, height: 2, param: 42, first: [0, 1, 2, 3] }]
        );
        assert!(uninstall().is_some());
    }

    #[test]
    fn without_sink_nothing_happens() {
        let data = [0u8; 4];
        let result = unsafe { submit_raw(data.as_ptr() as usize, None, 1, 1, 0) };
        assert!(matches!(result, Err(ProcessError::NotInstalled)));
        // the exported call swallows it
        unsafe { doOpenCvTask(data.as_ptr() as usize, 1, 1, 0) };
    }

    #[test]
    fn rejects_bad_arguments() {
        let recorder = Recorder::default();
        let calls = recorder.calls.clone();
        install(recorder);

        let data = [0u8; 16];
        let addr = data.as_ptr() as usize;
        unsafe {
            doOpenCvTask(0, 2, 2, 0);
            doOpenCvTask(addr, -2, 2, 0);
            doOpenCvTask(addr, 2, 0, 0);
            doOpenCvTaskWithLen(addr, 12, 2, 2, 0);
        }
        assert!(calls.borrow().is_empty());

        let err = unsafe { submit_raw(addr, Some(12), 2, 2, 0) }.unwrap_err();
        assert!(matches!(err, ProcessError::Frame(FrameError::LengthMismatch { .. })));

        unsafe { doOpenCvTaskWithLen(addr, 16, 2, 2, 7) };
        assert_eq!(calls.borrow().len(), 1);
        uninstall();
    }

    /// Calls back into the export from inside `submit`.
    struct Reentrant {
        inner: Rc<RefCell<Vec<String>>>,
    }

    impl FrameSink for Reentrant {
        fn submit(&mut self, frame: FrameView<'_>, param: i32) -> Result<()> {
            let addr = frame.as_bytes().as_ptr() as usize;
            let (w, h) = (frame.width() as i32, frame.height() as i32);
            let nested = unsafe { submit_raw(addr, None, w, h, param) };
            self.inner.borrow_mut().push(format!("{nested:?}"));
            assert!(with_session(|s| s.is_open()).is_none());
            // and the exported form just logs
            unsafe { doOpenCvTask(addr, w, h, param) };
            Ok(())
        }
    }

    #[test]
    fn reentrant_call_is_dropped_not_panicking() {
        let inner = Rc::new(RefCell::new(Vec::new()));
        install(Reentrant { inner: inner.clone() });

        let data = [1u8; 8];
        let outer = unsafe { submit_raw(data.as_ptr() as usize, None, 2, 1, 5) };
        assert!(outer.is_ok());
        assert_eq!(*inner.borrow(), vec!["Err(Busy)".to_string()]);

        // the slot is usable again afterwards
        assert_eq!(with_session(|s| s.is_open()), Some(true));
        uninstall();
    }

    #[test]
    fn with_session_reaches_sink() {
        assert!(with_session(|s| s.is_open()).is_none());
        install(Recorder::default());
        assert_eq!(with_session(|s| s.is_open()), Some(true));
        uninstall();
    }
}
