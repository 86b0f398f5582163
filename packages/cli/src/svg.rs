//! Standalone SVG output of the vector view.

use evidence_map::MapInstance;
use evidence_map_region_models::RegionLevel;

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}

/// Renders every visible tier, coarsest first, inside the current view box.
#[must_use]
pub fn render(map: &mut MapInstance, width: u32, height: u32) -> String {
    let view_box = map.view_box();
    let mut out = format!(
        "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{width}\" height=\"{height}\" \
         viewBox=\"{view_box}\" preserveAspectRatio=\"xMidYMid meet\">\n"
    );

    for level in RegionLevel::all() {
        let features = map.vector_features(*level);
        if features.is_empty() {
            continue;
        }
        out.push_str(&format!("  <g class=\"{level}\">\n"));
        for feature in features {
            let style = &feature.style;
            let dash = style
                .dash_array
                .as_deref()
                .map(|dash| format!(" stroke-dasharray=\"{dash}\""))
                .unwrap_or_default();
            out.push_str(&format!(
                "    <path d=\"{}\" fill=\"{}\" fill-opacity=\"{}\" fill-rule=\"evenodd\" \
                 stroke=\"{}\" stroke-opacity=\"{}\" stroke-width=\"{}\"{dash} \
                 vector-effect=\"non-scaling-stroke\"><title>{}: {}</title></path>\n",
                feature.path,
                escape(&style.fill_color),
                style.fill_opacity,
                escape(&style.color),
                style.opacity,
                style.weight,
                escape(&feature.name),
                feature.amount,
            ));
        }
        out.push_str("  </g>\n");
    }

    out.push_str("</svg>\n");
    out
}
