use crate::domain::Polygon;

/// Line style of the boundary overlay. The outline is never filled.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PathStyle {
    /// Line width, 2..=15 on the provider side.
    pub weight: u8,
    /// 0xRRGGBB
    pub color: u32,
    /// 0.0..=1.0
    pub opacity: f32,
}

impl Default for PathStyle {
    fn default() -> Self {
        Self {
            weight: 8,
            color: 0x0000FF,
            opacity: 1.0,
        }
    }
}

impl PathStyle {
    /// `weight,color,opacity,fillcolor,fillopacity` with both fill fields empty.
    pub fn prefix(&self) -> String {
        format!("{},0x{:06X},{},,", self.weight, self.color, self.opacity)
    }

    /// Full `paths` value: `<style>:<lon,lat;lon,lat;...>`.
    pub fn encode(&self, polygon: &Polygon) -> String {
        format!("{}:{}", self.prefix(), polygon.to_path_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_prefix() {
        assert_eq!(PathStyle::default().prefix(), "8,0x0000FF,1,,");
    }

    #[test]
    fn test_encode() {
        let polygon = Polygon::parse("1.5,2;3,4;1.5,2");
        let style = PathStyle {
            weight: 4,
            color: 0xff0000,
            opacity: 0.5,
        };
        assert_eq!(style.encode(&polygon), "4,0xFF0000,0.5,,:1.5,2;3,4;1.5,2");
    }
}
