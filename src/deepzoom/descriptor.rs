//! DZI descriptor document.

/// Build the DZI XML descriptor for a slide.
///
/// Viewers parse this by fixed schema, so the attribute order and the
/// deepzoom namespace declaration are part of the wire contract and must
/// not change. Tiles are always served as JPEG.
///
/// # Example Output
///
/// ```xml
/// <Image TileSize="254" Overlap="1" Format="jpeg" xmlns="http://schemas.microsoft.com/deepzoom/2008">
///   <Size Width="46920" Height="33600"/>
/// </Image>
/// ```
pub fn build_dzi(width: u32, height: u32, tile_size: u32, overlap: u32) -> String {
    format!(
        "<Image TileSize=\"{tile_size}\" Overlap=\"{overlap}\" Format=\"jpeg\" \
         xmlns=\"http://schemas.microsoft.com/deepzoom/2008\">\n  \
         <Size Width=\"{width}\" Height=\"{height}\"/>\n</Image>"
    )
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    /// Pull an attribute value back out of the serialized document.
    fn attribute(xml: &str, name: &str) -> Option<u32> {
        let marker = format!("{name}=\"");
        let start = xml.find(&marker)? + marker.len();
        let end = xml[start..].find('"')? + start;
        xml[start..end].parse().ok()
    }

    #[test]
    fn test_descriptor_shape() {
        let xml = build_dzi(46920, 33600, 254, 1);

        assert!(xml.starts_with("<Image TileSize=\"254\" Overlap=\"1\" Format=\"jpeg\""));
        assert!(xml.contains("xmlns=\"http://schemas.microsoft.com/deepzoom/2008\""));
        assert!(xml.contains("<Size Width=\"46920\" Height=\"33600\"/>"));
        assert!(xml.ends_with("</Image>"));
    }

    #[test]
    fn test_descriptor_round_trip() {
        let xml = build_dzi(10000, 8000, 512, 2);

        assert_eq!(attribute(&xml, "TileSize"), Some(512));
        assert_eq!(attribute(&xml, "Overlap"), Some(2));
        assert_eq!(attribute(&xml, "Width"), Some(10000));
        assert_eq!(attribute(&xml, "Height"), Some(8000));
    }

    #[test]
    fn test_descriptor_is_deterministic() {
        assert_eq!(build_dzi(100, 50, 254, 1), build_dzi(100, 50, 254, 1));
    }
}
