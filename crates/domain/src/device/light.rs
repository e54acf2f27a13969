use crate::value::Rgb;

/// Mode values of the colour light.
pub const MODE_OFF: &str = "off";
pub const MODE_COLOR: &str = "color";

/// Command written to `RGB_LED` for the light's current settings.
///
/// Only a powered light in colour mode with a well-formed colour is lit;
/// everything else turns it off.
#[must_use]
pub fn led_command(power: bool, mode: &str, color: &str) -> String {
    match color.parse::<Rgb>() {
        Ok(rgb) if power && mode == MODE_COLOR => {
            format!("color {} {} {}", rgb.red, rgb.green, rgb.blue)
        }
        _ => "color off".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_emit_decimal_channels_in_color_mode() {
        assert_eq!(led_command(true, MODE_COLOR, "#00FF00"), "color 0 255 0");
        assert_eq!(led_command(true, MODE_COLOR, "#FF7F27"), "color 255 127 39");
    }

    #[test]
    fn should_turn_off_when_unpowered_regardless_of_color() {
        assert_eq!(led_command(false, MODE_COLOR, "#00FF00"), "color off");
    }

    #[test]
    fn should_turn_off_outside_color_mode() {
        assert_eq!(led_command(true, MODE_OFF, "#00FF00"), "color off");
        assert_eq!(led_command(true, "", "#00FF00"), "color off");
    }
}
