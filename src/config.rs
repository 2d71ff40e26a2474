use gfx_hal::window;

/// Fixed startup parameters. Built once in `main` and handed down by reference.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub title: &'static str,
    pub dims: window::Extent2D,
    pub clear_color: [f32; 4],
    pub triangle_color: [f32; 4],
    pub app_name: &'static str,
    pub api_version: ApiVersion,
    pub frames_in_flight: usize,
}

/// Requested graphics API version, packed into the instance version word.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ApiVersion {
    pub major: u32,
    pub minor: u32,
}

impl ApiVersion {
    pub fn encode(self) -> u32 {
        (self.major << 22) | (self.minor << 12)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            title: "OpenGL",
            dims: window::Extent2D {
                width: 800,
                height: 800,
            },
            clear_color: [0.07, 0.13, 0.17, 1.0],
            triangle_color: [0.8, 0.3, 0.02, 1.0],
            app_name: "hello-triangle",
            api_version: ApiVersion { major: 3, minor: 3 },
            frames_in_flight: 2,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_reference_window() {
        let config = AppConfig::default();
        assert_eq!(config.title, "OpenGL");
        assert_eq!(config.dims.width, 800);
        assert_eq!(config.dims.height, 800);
        assert_eq!(config.clear_color, [0.07, 0.13, 0.17, 1.0]);
        assert_eq!(config.triangle_color, [0.8, 0.3, 0.02, 1.0]);
        assert!(config.frames_in_flight > 0);
    }

    #[test]
    fn api_version_packs_major_and_minor() {
        let version = ApiVersion { major: 3, minor: 3 };
        assert_eq!(version.encode() >> 22, 3);
        assert_eq!((version.encode() >> 12) & 0x3ff, 3);
    }
}
