//! Traffic-edge palette for the networking view. Colors are assigned to
//! traffic sources in first-seen order and cycle once the palette is
//! exhausted, so coloring is reproducible for identical inputs.

const BASE_COLORS: [&str; 6] = [
    "#0DADEA", // blue
    "#95D58F", // green
    "#F4C030", // orange
    "#FF6262", // red
    "#4B0082", // purple
    "#964B00", // brown
];

const DARKEN_STEPS: [f64; 4] = [0.0, 0.25, 0.4, 0.6];

fn darken(hex: &str, amount: f64) -> String {
    let value = u32::from_str_radix(hex.trim_start_matches('#'), 16).unwrap_or(0);
    let scale = |channel: u32| -> u32 {
        let scaled = (channel as f64) * (1.0 - amount);
        scaled.round().clamp(0.0, 255.0) as u32
    };
    format!(
        "#{:02X}{:02X}{:02X}",
        scale((value >> 16) & 0xFF),
        scale((value >> 8) & 0xFF),
        scale(value & 0xFF)
    )
}

/// The full ordered palette: every base color at each darkness stage.
pub fn traffic_colors() -> Vec<String> {
    DARKEN_STEPS
        .iter()
        .flat_map(|step| BASE_COLORS.iter().map(|base| darken(base, *step)))
        .collect()
}

/// Color for the i-th distinct traffic source.
pub fn palette_color(index: usize) -> String {
    let palette = traffic_colors();
    palette[index % palette.len()].clone()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn palette_has_one_entry_per_base_and_stage() {
        assert_eq!(traffic_colors().len(), BASE_COLORS.len() * DARKEN_STEPS.len());
    }

    #[test]
    fn first_stage_keeps_base_colors() {
        let palette = traffic_colors();
        assert_eq!(palette[0], "#0DADEA");
        assert_eq!(palette[3], "#FF6262");
    }

    #[test]
    fn darken_scales_channels() {
        assert_eq!(darken("#FF6262", 0.5), "#803131");
        assert_eq!(darken("#000000", 0.25), "#000000");
    }

    #[test]
    fn palette_color_cycles() {
        let len = traffic_colors().len();
        assert_eq!(palette_color(0), palette_color(len));
        assert_eq!(palette_color(5), palette_color(len + 5));
    }
}
