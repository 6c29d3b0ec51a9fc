//! Process-related WinAPI wrappers.
//!
//! Resolves the executable name owning a window. The process handle opened
//! for the lookup never outlives the call.

use windows::Win32::Foundation::{CloseHandle, HANDLE};
use windows::Win32::System::ProcessStatus::GetModuleBaseNameW;
use windows::Win32::System::Threading::{
    OpenProcess, PROCESS_QUERY_LIMITED_INFORMATION, PROCESS_VM_READ,
};

/// Owned process handle, closed on drop.
struct ProcessHandle(HANDLE);

impl ProcessHandle {
    /// Opens a process with limited query and VM read permissions.
    ///
    /// Fails for protected or elevated processes and for processes that
    /// exited in the meantime.
    fn open(pid: u32) -> windows::core::Result<Self> {
        let handle = unsafe {
            OpenProcess(
                PROCESS_QUERY_LIMITED_INFORMATION | PROCESS_VM_READ,
                false,
                pid,
            )?
        };

        if handle.is_invalid() {
            return Err(windows::core::Error::from_win32());
        }
        Ok(Self(handle))
    }

    fn as_raw(&self) -> HANDLE {
        self.0
    }
}

impl Drop for ProcessHandle {
    fn drop(&mut self) {
        unsafe {
            let _ = CloseHandle(self.0);
        }
    }
}

/// Gets the executable name of a process by its process ID.
///
/// # Example
/// ```no_run
/// use window_monitor::winapi_utils::get_process_name;
///
/// let name = get_process_name(std::process::id()).unwrap();
/// println!("Process name: {}", name);
/// ```
pub fn get_process_name(pid: u32) -> windows::core::Result<String> {
    let handle = ProcessHandle::open(pid)?;

    // MAX_PATH
    let mut buffer: [u16; 260] = [0; 260];

    let len = unsafe { GetModuleBaseNameW(handle.as_raw(), None, &mut buffer) };
    if len == 0 {
        return Err(windows::core::Error::from_win32());
    }

    Ok(String::from_utf16_lossy(&buffer[..len as usize]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_current_process_name() {
        let name = get_process_name(std::process::id()).unwrap();
        assert!(name.to_lowercase().ends_with(".exe"));
    }

    #[test]
    fn test_get_process_name_invalid_pid() {
        // PID 0 is the System Idle Process and cannot be opened
        assert!(get_process_name(0).is_err());
    }

    #[test]
    fn test_process_handle_drop() {
        let pid = std::process::id();
        for _ in 0..100 {
            let handle = ProcessHandle::open(pid).unwrap();
            drop(handle);
        }
    }
}
