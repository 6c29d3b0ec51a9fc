//! Icon creation for the system tray.

use tray_icon::Icon;

const ICON_SIZE: u32 = 32;

/// Amber used for the ring and the pupil.
const ACCENT: [u8; 4] = [245, 166, 35, 255];

/// Draws the tray icon: an amber ring around a centered dot.
pub fn create_default_icon() -> Result<Icon, Box<dyn std::error::Error>> {
    let rgba = render_icon(ICON_SIZE);
    Icon::from_rgba(rgba, ICON_SIZE, ICON_SIZE).map_err(|e| e.into())
}

fn render_icon(size: u32) -> Vec<u8> {
    let center = size as f32 / 2.0;
    let outer = center - 1.0;
    let inner = outer - 4.0;
    let pupil = size as f32 / 6.0;

    let mut rgba = Vec::with_capacity((size * size * 4) as usize);
    for y in 0..size {
        for x in 0..size {
            let dx = x as f32 + 0.5 - center;
            let dy = y as f32 + 0.5 - center;
            let distance = (dx * dx + dy * dy).sqrt();

            let on_ring = distance <= outer && distance >= inner;
            if on_ring || distance <= pupil {
                rgba.extend_from_slice(&ACCENT);
            } else {
                rgba.extend_from_slice(&[0, 0, 0, 0]);
            }
        }
    }
    rgba
}
