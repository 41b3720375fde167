//! System icon providers
//!
//! A provider hands back a process-owned [`Icon`]. Any native handle it
//! touches is released before the call returns.

use crate::icon::{synthesize, Icon, IconKind, IconSize};
use crate::AppError;
use std::path::Path;
use std::sync::Arc;

/// Source of folder and file icons
pub trait SystemIconProvider: Send + Sync {
    /// The standard folder icon; identical for every directory
    fn folder_icon(&self, size: IconSize) -> Result<Icon, AppError>;

    /// Icon for a file, chosen from its extension and attributes
    fn file_icon(&self, path: &Path, extension: &str, size: IconSize) -> Result<Icon, AppError>;
}

/// Portable provider drawing procedural glyphs
#[derive(Debug, Default, Clone, Copy)]
pub struct BuiltinIconProvider;

impl SystemIconProvider for BuiltinIconProvider {
    fn folder_icon(&self, size: IconSize) -> Result<Icon, AppError> {
        Ok(synthesize(IconKind::Folder, size))
    }

    fn file_icon(&self, _path: &Path, _extension: &str, size: IconSize) -> Result<Icon, AppError> {
        Ok(synthesize(IconKind::Document, size))
    }
}

/// The platform's provider: shell icons on Windows, built-in glyphs elsewhere
pub fn default_provider() -> Arc<dyn SystemIconProvider> {
    #[cfg(windows)]
    {
        Arc::new(shell::ShellIconProvider)
    }

    #[cfg(not(windows))]
    {
        Arc::new(BuiltinIconProvider)
    }
}

#[cfg(windows)]
pub use shell::ShellIconProvider;

#[cfg(windows)]
mod shell {
    use super::*;
    use std::ffi::{c_void, OsStr};
    use std::os::windows::ffi::OsStrExt;
    use windows::core::PCWSTR;
    use windows::Win32::Graphics::Gdi::{
        CreateCompatibleDC, DeleteDC, DeleteObject, GetDIBits, BITMAPINFO, BITMAPINFOHEADER,
        BI_RGB, DIB_RGB_COLORS, HBITMAP, HDC,
    };
    use windows::Win32::Storage::FileSystem::{
        FILE_ATTRIBUTE_DIRECTORY, FILE_ATTRIBUTE_NORMAL, FILE_FLAGS_AND_ATTRIBUTES,
    };
    use windows::Win32::UI::Shell::{
        SHGetFileInfoW, SHFILEINFOW, SHGFI_ICON, SHGFI_LARGEICON, SHGFI_SMALLICON,
        SHGFI_USEFILEATTRIBUTES,
    };
    use windows::Win32::UI::WindowsAndMessaging::{DestroyIcon, GetIconInfo, HICON, ICONINFO};

    /// Shell icons via `SHGetFileInfoW`
    #[derive(Debug, Default, Clone, Copy)]
    pub struct ShellIconProvider;

    impl SystemIconProvider for ShellIconProvider {
        fn folder_icon(&self, size: IconSize) -> Result<Icon, AppError> {
            // With SHGFI_USEFILEATTRIBUTES the path need not exist
            let handle = query("folder", FILE_ATTRIBUTE_DIRECTORY, size)
                .ok_or_else(|| AppError::IconUnavailable("folder".into()))?;
            copy_icon(&handle).ok_or_else(|| AppError::IconUnavailable("folder".into()))
        }

        fn file_icon(&self, path: &Path, _extension: &str, size: IconSize) -> Result<Icon, AppError> {
            let name = path.to_string_lossy();
            let handle = query(&name, FILE_ATTRIBUTE_NORMAL, size)
                .ok_or_else(|| AppError::IconUnavailable(name.to_string()))?;
            copy_icon(&handle).ok_or_else(|| AppError::IconUnavailable(name.to_string()))
        }
    }

    /// Owns an `HICON`; destroyed exactly once on drop
    struct OwnedIcon(HICON);

    impl Drop for OwnedIcon {
        fn drop(&mut self) {
            unsafe {
                if let Err(e) = DestroyIcon(self.0) {
                    tracing::warn!("DestroyIcon failed: {}", e);
                }
            }
        }
    }

    struct OwnedBitmap(HBITMAP);

    impl Drop for OwnedBitmap {
        fn drop(&mut self) {
            if !self.0.is_invalid() {
                unsafe {
                    let _ = DeleteObject(self.0);
                }
            }
        }
    }

    struct OwnedDc(HDC);

    impl Drop for OwnedDc {
        fn drop(&mut self) {
            unsafe {
                let _ = DeleteDC(self.0);
            }
        }
    }

    fn query(path: &str, attributes: FILE_FLAGS_AND_ATTRIBUTES, size: IconSize) -> Option<OwnedIcon> {
        let wide: Vec<u16> = OsStr::new(path).encode_wide().chain(std::iter::once(0)).collect();
        let mut info = SHFILEINFOW::default();
        let flags = SHGFI_ICON
            | SHGFI_USEFILEATTRIBUTES
            | match size {
                IconSize::Small => SHGFI_SMALLICON,
                IconSize::Large => SHGFI_LARGEICON,
            };

        unsafe {
            SHGetFileInfoW(
                PCWSTR(wide.as_ptr()),
                attributes,
                Some(&mut info as *mut SHFILEINFOW),
                std::mem::size_of::<SHFILEINFOW>() as u32,
                flags,
            );
        }

        if info.hIcon.is_invalid() {
            None
        } else {
            Some(OwnedIcon(info.hIcon))
        }
    }

    /// Copy an icon's pixels into an owned RGBA buffer
    fn copy_icon(icon: &OwnedIcon) -> Option<Icon> {
        let mut info = ICONINFO::default();
        unsafe { GetIconInfo(icon.0, &mut info) }.ok()?;
        let color = OwnedBitmap(info.hbmColor);
        let mask = OwnedBitmap(info.hbmMask);
        if color.0.is_invalid() {
            return None;
        }

        let dc = OwnedDc(unsafe { CreateCompatibleDC(HDC::default()) });
        let (width, height, mut pixels) = read_bitmap(&dc, &color)?;

        // Legacy icons carry no alpha; derive it from the AND mask
        if pixels.chunks_exact(4).all(|p| p[3] == 0) {
            let (_, _, mask_pixels) = read_bitmap(&dc, &mask)?;
            for (px, m) in pixels.chunks_exact_mut(4).zip(mask_pixels.chunks_exact(4)) {
                px[3] = if m[0] == 0 { 255 } else { 0 };
            }
        }

        Icon::from_rgba(width, height, pixels)
    }

    /// Top-down 32-bit read, converted from BGRA to RGBA
    fn read_bitmap(dc: &OwnedDc, bitmap: &OwnedBitmap) -> Option<(u32, u32, Vec<u8>)> {
        let mut bmi = BITMAPINFO::default();
        bmi.bmiHeader.biSize = std::mem::size_of::<BITMAPINFOHEADER>() as u32;

        // First pass fills in the dimensions
        let filled = unsafe { GetDIBits(dc.0, bitmap.0, 0, 0, None, &mut bmi, DIB_RGB_COLORS) };
        if filled == 0 {
            return None;
        }

        let width = bmi.bmiHeader.biWidth.unsigned_abs();
        let height = bmi.bmiHeader.biHeight.unsigned_abs();
        bmi.bmiHeader.biHeight = -(height as i32);
        bmi.bmiHeader.biPlanes = 1;
        bmi.bmiHeader.biBitCount = 32;
        bmi.bmiHeader.biCompression = BI_RGB.0;
        bmi.bmiHeader.biSizeImage = 0;

        let mut pixels = vec![0u8; (width * height * 4) as usize];
        let lines = unsafe {
            GetDIBits(
                dc.0,
                bitmap.0,
                0,
                height,
                Some(pixels.as_mut_ptr() as *mut c_void),
                &mut bmi,
                DIB_RGB_COLORS,
            )
        };
        if lines == 0 {
            return None;
        }

        for px in pixels.chunks_exact_mut(4) {
            px.swap(0, 2);
        }
        Some((width, height, pixels))
    }

    #[cfg(test)]
    mod tests {
        use super::*;
        use windows::Win32::System::Threading::{
            GetCurrentProcess, GetGuiResources, GR_GDIOBJECTS, GR_USEROBJECTS,
        };

        fn handle_counts() -> (u32, u32) {
            unsafe {
                let process = GetCurrentProcess();
                (
                    GetGuiResources(process, GR_GDIOBJECTS),
                    GetGuiResources(process, GR_USEROBJECTS),
                )
            }
        }

        #[test]
        fn test_shell_icons_release_handles() {
            let provider = ShellIconProvider;
            let folder = provider.folder_icon(IconSize::Small).unwrap();
            let file = provider
                .file_icon(Path::new("x.txt"), "txt", IconSize::Small)
                .unwrap();
            assert_eq!((folder.width(), folder.height()), (16, 16));
            assert_eq!((file.width(), file.height()), (16, 16));

            let (gdi_before, user_before) = handle_counts();
            for _ in 0..50 {
                provider.folder_icon(IconSize::Small).unwrap();
                provider
                    .file_icon(Path::new("x.txt"), "txt", IconSize::Large)
                    .unwrap();
            }
            let (gdi_after, user_after) = handle_counts();

            // The shell keeps a few handles of its own in its image lists
            assert!(gdi_after <= gdi_before + 4, "GDI objects grew {} -> {}", gdi_before, gdi_after);
            assert!(user_after <= user_before + 4, "USER objects grew {} -> {}", user_before, user_after);
        }
    }
}
