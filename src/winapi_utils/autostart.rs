//! Start-on-logon registration via the HKCU Run registry key.
//!
//! Writes a `WindowMonitor` value under
//! `HKEY_CURRENT_USER\Software\Microsoft\Windows\CurrentVersion\Run`.
//! No elevation is required since HKCU is per-user.

use crate::error::AutostartError;
use std::path::Path;
use windows::core::PCWSTR;
use windows::Win32::Foundation::ERROR_FILE_NOT_FOUND;
use windows::Win32::System::Registry::{
    RegCloseKey, RegDeleteValueW, RegOpenKeyExW, RegQueryValueExW, RegSetValueExW, HKEY,
    HKEY_CURRENT_USER, KEY_QUERY_VALUE, KEY_SET_VALUE, REG_SAM_FLAGS, REG_SZ,
};

const RUN_KEY: &str = r"Software\Microsoft\Windows\CurrentVersion\Run";
const VALUE_NAME: &str = "WindowMonitor";

/// Registers `exe_path` to start on Windows logon.
pub fn enable(exe_path: &Path) -> Result<(), AutostartError> {
    let exe_path = std::path::absolute(exe_path)?;
    if !exe_path.exists() {
        return Err(AutostartError::ExecutableNotFound(exe_path));
    }

    let key = RunKey::open(KEY_SET_VALUE)?;
    key.set_string(VALUE_NAME, &exe_path.display().to_string())?;

    tracing::info!(path = %exe_path.display(), "Auto-start enabled");
    Ok(())
}

/// Removes the autostart entry. A missing entry is not an error.
pub fn disable() -> Result<(), AutostartError> {
    let key = RunKey::open(KEY_SET_VALUE)?;
    key.delete(VALUE_NAME)?;

    tracing::info!("Auto-start disabled");
    Ok(())
}

/// Checks whether the autostart entry exists.
pub fn is_enabled() -> Result<bool, AutostartError> {
    let key = RunKey::open(KEY_QUERY_VALUE)?;
    Ok(key.has_value(VALUE_NAME)?)
}

/// Open handle on the Run key, closed on drop.
struct RunKey(HKEY);

impl RunKey {
    fn open(access: REG_SAM_FLAGS) -> windows::core::Result<Self> {
        let wide_key = to_wide(RUN_KEY);
        let mut key = HKEY::default();
        let status = unsafe {
            RegOpenKeyExW(
                HKEY_CURRENT_USER,
                PCWSTR(wide_key.as_ptr()),
                0,
                access,
                &mut key,
            )
        };
        status.ok()?;
        Ok(Self(key))
    }

    fn set_string(&self, name: &str, value: &str) -> windows::core::Result<()> {
        let wide_name = to_wide(name);
        let wide_value = to_wide(value);
        let bytes: Vec<u8> = wide_value.iter().flat_map(|c| c.to_le_bytes()).collect();

        let status =
            unsafe { RegSetValueExW(self.0, PCWSTR(wide_name.as_ptr()), 0, REG_SZ, Some(bytes.as_slice())) };
        status.ok()
    }

    fn delete(&self, name: &str) -> windows::core::Result<()> {
        let wide_name = to_wide(name);
        let status = unsafe { RegDeleteValueW(self.0, PCWSTR(wide_name.as_ptr())) };
        if status == ERROR_FILE_NOT_FOUND {
            return Ok(());
        }
        status.ok()
    }

    fn has_value(&self, name: &str) -> windows::core::Result<bool> {
        let wide_name = to_wide(name);
        let status = unsafe {
            RegQueryValueExW(self.0, PCWSTR(wide_name.as_ptr()), None, None, None, None)
        };
        if status == ERROR_FILE_NOT_FOUND {
            return Ok(false);
        }
        status.ok()?;
        Ok(true)
    }
}

impl Drop for RunKey {
    fn drop(&mut self) {
        unsafe {
            let _ = RegCloseKey(self.0);
        }
    }
}

fn to_wide(s: &str) -> Vec<u16> {
    s.encode_utf16().chain(std::iter::once(0)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enable_rejects_missing_executable() {
        let missing = std::env::temp_dir().join("window-monitor-missing.exe");
        assert!(matches!(
            enable(&missing),
            Err(AutostartError::ExecutableNotFound(_))
        ));
    }

    #[test]
    fn test_is_enabled_reads_registry() {
        assert!(is_enabled().is_ok());
    }
}
