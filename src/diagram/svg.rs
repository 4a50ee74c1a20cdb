//! Low-level SVG emission used by both diagram renderers.
//!
//! Everything is written into a single `String`; coordinates are integers
//! because the layouts only ever produce whole pixels.

use crate::xml::escape;

pub struct SvgCanvas {
    buf: String,
}

impl SvgCanvas {
    /// Open a document of exactly `width` × `height`.
    pub fn new(width: i32, height: i32, font_family: &str, background: Option<&str>) -> Self {
        let mut buf = String::with_capacity(4096);
        buf.push_str(&format!(
            r#"<svg xmlns="http://www.w3.org/2000/svg" xmlns:xlink="http://www.w3.org/1999/xlink" width="{w}" height="{h}" viewBox="0 0 {w} {h}" font-family="{font}">"#,
            w = width,
            h = height,
            font = escape(font_family),
        ));
        buf.push('\n');
        if let Some(fill) = background {
            buf.push_str(&format!(
                r#"<rect width="100%" height="100%" fill="{}" />"#,
                escape(fill)
            ));
            buf.push('\n');
        }
        Self { buf }
    }

    pub fn finish(mut self) -> String {
        self.buf.push_str("</svg>\n");
        self.buf
    }

    pub fn group(&mut self, style: &str) {
        self.buf
            .push_str(&format!("<g style=\"{}\">\n", escape(style)));
    }

    pub fn group_with_id(&mut self, id: &str) {
        self.buf.push_str(&format!("<g id=\"{}\">\n", escape(id)));
    }

    pub fn group_translated(&mut self, dx: i32, dy: i32) {
        self.buf
            .push_str(&format!("<g transform=\"translate({},{})\">\n", dx, dy));
    }

    pub fn group_end(&mut self) {
        self.buf.push_str("</g>\n");
    }

    /// Define a filled arrowhead marker, referenced as `url(#id)`.
    #[allow(clippy::too_many_arguments)]
    pub fn arrowhead_marker(
        &mut self,
        id: &str,
        ref_x: i32,
        ref_y: i32,
        width: i32,
        height: i32,
        orient: &str,
        fill: &str,
    ) {
        self.buf.push_str(&format!(
            r#"<defs><marker id="{}" orient="{}" refX="{}" refY="{}" markerWidth="{}" markerHeight="{}" style="fill:{}">"#,
            escape(id),
            escape(orient),
            ref_x,
            ref_y,
            width,
            height,
            escape(fill),
        ));
        self.buf.push_str(&format!(
            r#"<path d="M 0,0 V {} L{},{} Z" /></marker></defs>"#,
            height,
            width,
            height / 2
        ));
        self.buf.push('\n');
    }

    pub fn path(&mut self, d: &str, style: Option<&str>) {
        self.buf.push_str(&format!("<path d=\"{}\"", escape(d)));
        self.push_style(style);
        self.buf.push_str(" />\n");
    }

    pub fn line(&mut self, from: (i32, i32), to: (i32, i32), style: Option<&str>) {
        self.line_with_class(from, to, None, style);
    }

    pub fn line_with_class(
        &mut self,
        (x1, y1): (i32, i32),
        (x2, y2): (i32, i32),
        class: Option<&str>,
        style: Option<&str>,
    ) {
        self.buf.push_str(&format!(
            r#"<line x1="{}" y1="{}" x2="{}" y2="{}""#,
            x1, y1, x2, y2
        ));
        if let Some(class) = class {
            self.buf.push_str(&format!(" class=\"{}\"", escape(class)));
        }
        self.push_style(style);
        self.buf.push_str(" />\n");
    }

    pub fn circle(&mut self, cx: i32, cy: i32, r: i32) {
        self.buf
            .push_str(&format!("<circle cx=\"{}\" cy=\"{}\" r=\"{}\" />\n", cx, cy, r));
    }

    pub fn round_rect(&mut self, x: i32, y: i32, width: i32, height: i32, rx: i32, ry: i32) {
        self.buf.push_str(&format!(
            r#"<rect x="{}" y="{}" width="{}" height="{}" rx="{}" ry="{}" />"#,
            x, y, width, height, rx, ry
        ));
        self.buf.push('\n');
    }

    pub fn text(&mut self, x: i32, y: i32, text: &str, style: Option<&str>) {
        self.text_with_prefix(x, y, "", text, style);
    }

    /// Text run whose `prefix` is trusted markup and written as is, while
    /// `text` is escaped.
    pub fn text_with_prefix(
        &mut self,
        x: i32,
        y: i32,
        prefix: &str,
        text: &str,
        style: Option<&str>,
    ) {
        self.buf.push_str(&format!("<text x=\"{}\" y=\"{}\"", x, y));
        self.push_style(style);
        self.buf.push('>');
        self.buf.push_str(prefix);
        self.buf.push_str(&escape(text));
        self.buf.push_str("</text>\n");
    }

    /// Stack `lines` downwards from `(x, y)`, one line every `spacing` pixels.
    #[allow(clippy::too_many_arguments)]
    pub fn text_lines(
        &mut self,
        x: i32,
        y: i32,
        lines: &[String],
        font_size: i32,
        spacing: i32,
        fill: &str,
        anchor: &str,
    ) {
        self.group(&format!(
            "font-size:{}px;text-anchor:{};fill:{}",
            font_size, anchor, fill
        ));
        let mut line_y = y;
        for line in lines {
            self.text(x, line_y, line, None);
            line_y += spacing;
        }
        self.group_end();
    }

    /// Re-draw the element `id` shifted by `(x, y)`.
    pub fn use_ref(&mut self, x: i32, y: i32, id: &str) {
        self.buf.push_str(&format!(
            "<use x=\"{}\" y=\"{}\" xlink:href=\"#{}\" />\n",
            x,
            y,
            escape(id)
        ));
    }

    fn push_style(&mut self, style: Option<&str>) {
        if let Some(style) = style.filter(|s| !s.is_empty()) {
            self.buf.push_str(&format!(" style=\"{}\"", escape(style)));
        }
    }
}
