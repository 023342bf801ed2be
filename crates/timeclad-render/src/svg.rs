//! Vector output: an Inkscape-compatible SVG document with one layer per drawing concern.

use crate::assets::{self, Asset, SvgAsset};
use crate::error::{Error, Result};
use crate::util::{escape_xml, escape_xml_into, xml_id};
use std::fmt::Write as _;
use timeclad_core::{Calendar, Color, Config, Date, ImageKind};
use timeclad_layout::Layout;
use unicode_width::UnicodeWidthStr;

/// Horizontal margin left of the first year.
const MARGIN_PX: i32 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    LeftToRight,
    TopToBottom,
    RightToLeft,
    BottomToTop,
}

impl Orientation {
    pub fn from_config(value: i32) -> Result<Self> {
        match value {
            0 => Ok(Self::LeftToRight),
            1 => Ok(Self::TopToBottom),
            2 => Ok(Self::RightToLeft),
            3 => Ok(Self::BottomToTop),
            orientation => Err(Error::UnsupportedOrientation {
                orientation,
                reason: "expected 0 to 3",
            }),
        }
    }

    fn is_vertical(self) -> bool {
        matches!(self, Self::TopToBottom | Self::BottomToTop)
    }
}

/// Pixel geometry shared by every layer.
#[derive(Debug, Clone, Copy)]
struct Canvas {
    orientation: Orientation,
    x_px: i32,
    offset_px: i32,
    line_px: i32,
    year_px: i32,
    /// Height of one year bar plus a margin.
    bar_px: i32,
    top: i32,
    years: i32,
    origin_year: i32,
    calendar: Calendar,
    width: i32,
    height: i32,
    /// `width`/`height` swapped for vertical orientations.
    canvas_width: i32,
    canvas_height: i32,
    info_box_x: i32,
    info_box_y: i32,
}

impl Canvas {
    fn new(layout: &Layout, config: &Config) -> Result<Self> {
        let orientation = Orientation::from_config(config.orientation)?;
        let offset_px = config.offset_px;
        let bar_px = config.year_line_px + 3 * offset_px / 2;
        let years = layout.end_of_time.year - layout.beginning_of_time.year + 1;

        let mut canvas = Self {
            orientation,
            x_px: MARGIN_PX,
            offset_px,
            line_px: config.line_width,
            year_px: config.year_px,
            bar_px,
            top: bar_px,
            years,
            origin_year: layout.beginning_of_time.year,
            calendar: config.calendar(),
            width: years * config.year_px + 2 * MARGIN_PX,
            height: layout.maximum_offset * offset_px + 2 * bar_px,
            canvas_width: 0,
            canvas_height: 0,
            info_box_x: config.info_box_x,
            info_box_y: config.info_box_y,
        };

        // A negative info box position grows the canvas to the left or top.
        if config.info_box_x < 0 {
            if orientation != Orientation::LeftToRight {
                return Err(Error::UnsupportedOrientation {
                    orientation: config.orientation,
                    reason: "an info box outside the canvas needs orientation 0",
                });
            }
            canvas.x_px -= config.info_box_x + 10;
            canvas.width -= config.info_box_x + 10;
            canvas.info_box_x = 10;
        }
        if config.info_box_y < 0 {
            if orientation != Orientation::LeftToRight {
                return Err(Error::UnsupportedOrientation {
                    orientation: config.orientation,
                    reason: "an info box outside the canvas needs orientation 0",
                });
            }
            canvas.top -= config.info_box_y + 10;
            canvas.height -= config.info_box_y + 10;
            canvas.info_box_y = 10;
        }

        (canvas.canvas_width, canvas.canvas_height) = if orientation.is_vertical() {
            (canvas.height, canvas.width)
        } else {
            (canvas.width, canvas.height)
        };
        Ok(canvas)
    }

    fn lane_y(&self, lane: i32) -> i32 {
        lane * self.offset_px + self.top
    }

    fn px(&self, date: Date) -> i32 {
        date.px(self.origin_year, self.year_px, self.calendar) + self.x_px
    }
}

/// Rough text metrics derived from the font size (CSS `em` and `ex`).
#[derive(Debug, Clone, Copy)]
struct FontBox {
    em: i32,
    ex: i32,
}

impl FontBox {
    fn new(font_size: i32, correction: f64) -> Self {
        Self {
            em: (f64::from(font_size) / 1.675 * correction) as i32,
            ex: (f64::from(font_size) / 1.375 * correction) as i32,
        }
    }
}

fn text_width(text: &str) -> i32 {
    i32::try_from(UnicodeWidthStr::width(text)).unwrap_or(i32::MAX)
}

/// Renders `layout` as an SVG document.
///
/// Icons and included images are read from disk, relative to the input's folder.
pub fn render_svg(layout: &Layout, config: &Config) -> Result<String> {
    let canvas = Canvas::new(layout, config)?;

    let base = layout.base_dir.as_deref();
    let icons = layout
        .nodes
        .iter()
        .map(|n| match n.node.icon.trim() {
            "" => Ok(None),
            file => assets::load_icon(base, file).map(Some),
        })
        .collect::<Result<Vec<_>>>()?;
    let images = layout
        .images
        .iter()
        .map(|img| {
            let path = assets::resolve(base, &img.path);
            match img.kind {
                ImageKind::Svg => assets::load_svg(&path).map(Asset::Svg),
                ImageKind::Png => assets::load_png(&path).map(Asset::Png),
            }
        })
        .collect::<Result<Vec<_>>>()?;

    let mut writer = SvgWriter {
        layout,
        config,
        canvas,
        icons: &icons,
        images: &images,
        out: String::with_capacity(16 * 1024),
    };
    writer.write();
    tracing::info!(
        width = canvas.canvas_width,
        height = canvas.canvas_height,
        "rendered SVG"
    );
    Ok(writer.out)
}

struct SvgWriter<'a> {
    layout: &'a Layout,
    config: &'a Config,
    canvas: Canvas,
    icons: &'a [Option<Asset>],
    images: &'a [Asset],
    out: String,
}

impl SvgWriter<'_> {
    fn write(&mut self) {
        self.header();
        self.defs();

        let c = self.canvas;
        let (transform, labels, yearlines) = match c.orientation {
            Orientation::LeftToRight => (String::new(), String::new(), String::new()),
            Orientation::TopToBottom => (
                "matrix(0,1,1,0,0,1)".to_string(),
                "matrix(0,1,1,0,0,1)".to_string(),
                format!(
                    "matrix(0,1,1,0,0,1) rotate(90,0,0) translate(0,-{})",
                    c.canvas_width
                ),
            ),
            Orientation::RightToLeft => {
                let mirror = format!("matrix(-1,0,0,1,0,1) translate(-{},0)", c.canvas_width);
                (mirror.clone(), mirror.clone(), mirror)
            }
            Orientation::BottomToTop => (
                format!("rotate(-90,0,0) translate(-{},0)", c.canvas_height),
                format!("translate({},0) rotate(90,0,0)", c.canvas_height),
                String::new(),
            ),
        };

        if !transform.is_empty() {
            let _ = writeln!(
                self.out,
                "\n<g id='orientation' transform='{transform}'><!-- BEGIN orientation transform -->"
            );
        }
        self.background();
        self.rulers();
        self.domains();
        self.connectors();
        self.lines();
        self.dots();
        self.icons();
        self.labels(&labels);
        self.year_bars(&yearlines);
        if !transform.is_empty() {
            self.out.push_str("</g><!-- END orientation transform -->\n");
        }

        self.info_box();
        self.included_images();
        self.out.push_str("\n</svg>\n");
    }

    fn header(&mut self) {
        let c = self.canvas;
        let _ = write!(
            self.out,
            "<?xml version='1.0' encoding='UTF-8' standalone='yes'?>\n\
             <!-- Created with timeclad {} -->\n\
             \n\
             <svg\n  \
             xmlns='http://www.w3.org/2000/svg'\n  \
             xmlns:svg='http://www.w3.org/2000/svg'\n  \
             xmlns:xlink='http://www.w3.org/1999/xlink'\n  \
             xmlns:inkscape='http://www.inkscape.org/namespaces/inkscape'\n  \
             xmlns:sodipodi='http://sodipodi.sourceforge.net/DTD/sodipodi-0.dtd'\n  \
             xmlns:dc='http://purl.org/dc/elements/1.1/'\n  \
             xmlns:cc='http://creativecommons.org/ns#'\n  \
             xmlns:rdf='http://www.w3.org/1999/02/22-rdf-syntax-ns#'\n  \
             version='1.1'\n  \
             width='{}'\n  \
             height='{}'\n  \
             viewBox='0 0 {} {}'\n\
             >\n\n",
            env!("CARGO_PKG_VERSION"),
            c.canvas_width,
            c.canvas_height,
            c.canvas_width,
            c.canvas_height,
        );
    }

    fn defs(&mut self) {
        let cfg = self.config;
        let out = &mut self.out;
        out.push_str("<defs>\n\n");

        let _ = write!(
            out,
            "  <linearGradient id='__yearline' x1='0' y1='0' x2='1' y2='0'>\n    \
             <stop stop-color='{}' offset='0' stop-opacity='1' />\n    \
             <stop stop-color='{}' offset='1' stop-opacity='1' />\n  \
             </linearGradient>\n\n",
            cfg.year_line_color1, cfg.year_line_color2
        );

        let _ = write!(
            out,
            "  <linearGradient id='__infobox_fill' x1='0' y1='0' x2='0' y2='1'>\n    \
             <stop stop-color='{c1}' offset='0' stop-opacity='1' />\n    \
             <stop stop-color='{c2}' offset='1' stop-opacity='1' />\n  \
             </linearGradient>\n  \
             <linearGradient id='__infobox_stroke' x1='0' y1='0' x2='0' y2='1'>\n    \
             <stop stop-color='{c2}' offset='0' stop-opacity='1' />\n    \
             <stop stop-color='{c1}' offset='1' stop-opacity='1' />\n  \
             </linearGradient>\n  \
             <filter id='__infobox_shadow' color-interpolation-filters='sRGB'>\n    \
             <feGaussianBlur stdDeviation='5' />\n  \
             </filter>\n\n",
            c1 = cfg.info_box_color1,
            c2 = cfg.info_box_color2
        );

        for d in &self.layout.domains {
            let _ = write!(
                out,
                "  <linearGradient id='__domain_{id}' x1='0' y1='0' x2='1' y2='0'>\n    \
                 <stop stop-color='{color}' offset='0' stop-opacity='0' />\n    \
                 <stop stop-color='{color}' offset='1' stop-opacity='{opacity}' />\n  \
                 </linearGradient>\n",
                id = xml_id(&d.domain.node_name),
                color = d.domain.color,
                opacity = f64::from(d.domain.intensity) / 100.0
            );
        }

        let _ = writeln!(
            out,
            "\n  <circle id='__connectors_start' cx='0' cy='0' r='{}' stroke='none' />",
            self.canvas.line_px
        );
        for (i, c) in self.layout.connectors.iter().enumerate() {
            let _ = write!(
                out,
                "  <marker id='__connector_{i}' stroke='none' markerUnits='userSpaceOnUse' style='overflow:visible;'>\n    \
                 <use xlink:href='#__connectors_start' fill='{}' />\n  \
                 </marker>\n",
                c.connector.color
            );
        }

        // Fade-out tails of lineages that stopped before the end of time.
        let fade = cfg.stop_fade_out_px / self.canvas.line_px.max(1);
        let _ = writeln!(
            out,
            "\n  <line id='__fadeout' x1='0' y1='0' x2='{fade}' y2='0' stroke-width='1' />"
        );
        for n in &self.layout.nodes {
            if n.node.stop >= self.layout.end_of_time {
                continue;
            }
            let _ = write!(
                out,
                "  <linearGradient id='__fadeout_{id}' x1='0' y1='0' x2='{fade}' y2='0' gradientUnits='userSpaceOnUse'>\n    \
                 <stop stop-color='{color}' offset='0' stop-opacity='1' />\n    \
                 <stop stop-color='{color}' offset='1' stop-opacity='0' />\n  \
                 </linearGradient>\n  \
                 <marker id='__stop_{id}' markerWidth='{fade}' markerHeight='1' style='overflow:visible;'>\n    \
                 <use xlink:href='#__fadeout' stroke='url(#__fadeout_{id})' />\n  \
                 </marker>\n",
                id = xml_id(&n.node.name),
                color = n.node.color
            );
        }

        for asset in self.icons.iter().flatten() {
            if let Asset::Svg(svg) = asset {
                out.push_str(&svg.defs);
            }
        }

        out.push_str("\n<!-- BEGIN additional SVG images - definitions -->\n");
        for asset in self.images {
            if let Asset::Svg(svg) = asset {
                out.push_str(&svg.defs);
            }
        }
        out.push_str("<!-- END additional SVG images - definitions -->\n\n</defs>\n");
    }

    fn background(&mut self) {
        let c = self.canvas;
        let _ = write!(
            self.out,
            "\n<g inkscape:label='Background' inkscape:groupmode='layer' id='layer_background'>\n  \
             <rect x='0' y='0' width='{}' height='{}' rx='{r}' ry='{r}' fill='{}' />\n\
             </g>\n",
            c.width,
            c.height,
            self.config.main_background,
            r = c.offset_px / 2
        );
    }

    fn rulers(&mut self) {
        let c = self.canvas;
        let cfg = self.config;
        let months = cfg.months_in_year.max(1);
        let y1 = c.top - c.bar_px;
        let _ = writeln!(
            self.out,
            "\n<g inkscape:label='Year Rulers' inkscape:groupmode='layer' id='layer_yearrulers' \
             stroke-width='{}' stroke='{}'>",
            cfg.ruler_month_width, cfg.ruler_month_color
        );
        for i in 0..=c.years {
            let x = i * c.year_px + c.x_px;
            let _ = writeln!(
                self.out,
                "  <line x1='{x}' y1='{y1}' x2='{x}' y2='{}' stroke-width='{}' stroke='{}' />",
                c.height, cfg.ruler_width, cfg.ruler_color
            );
            if i == c.years {
                continue;
            }
            for m in 1..months {
                let xm = x + m * c.year_px / months;
                let _ = writeln!(
                    self.out,
                    "    <line x1='{xm}' y1='{y1}' x2='{xm}' y2='{}' />",
                    c.height
                );
            }
        }
        self.out.push_str("</g>\n");
    }

    fn domains(&mut self) {
        let c = self.canvas;
        let layout = self.layout;
        let right = c.px(Date::year(layout.end_of_time.year + 1));
        self.out
            .push_str("\n<g inkscape:label='Domains' inkscape:groupmode='layer' id='layer_domains'>\n");
        for d in &layout.domains {
            let start = layout.nodes[d.node].node.start;
            let x = c.px(start);
            let _ = writeln!(
                self.out,
                "  <rect x='{x}' y='{}' width='{}' height='{}' rx='{r}' ry='{r}' fill='url(#__domain_{})' />",
                (d.offset_a - 1) * c.offset_px + c.top,
                right - x + c.x_px,
                (d.offset_b - d.offset_a + 2) * c.offset_px,
                xml_id(&d.domain.node_name),
                r = c.offset_px / 2
            );
        }
        self.out.push_str("</g>\n");
    }

    fn connectors(&mut self) {
        let c = self.canvas;
        let layout = self.layout;
        let cfg = self.config;
        self.out.push_str(
            "\n<g inkscape:label='Connectors' inkscape:groupmode='layer' id='layer_connectors' style='opacity:0.6;'>\n",
        );
        for (i, pc) in layout.connectors.iter().enumerate() {
            let conn = &pc.connector;
            let sign = if pc.offset_a < pc.offset_b { 1 } else { -1 };
            let mut extra = String::new();
            if cfg.connectors_dashed == 1 {
                let _ = write!(
                    extra,
                    " stroke-dasharray='{t},{t}'",
                    t = conn.thickness
                );
            }
            if cfg.connector_dots == 1 {
                let _ = write!(extra, " marker-start='url(#__connector_{i})'");
            }
            let _ = writeln!(
                self.out,
                "  <line x1='{}' y1='{}' x2='{}' y2='{}' stroke='{}' stroke-width='{}'{extra} />",
                c.px(conn.from_when),
                c.lane_y(pc.offset_a) + sign * c.line_px / 2,
                c.px(conn.to_when),
                c.lane_y(pc.offset_b),
                conn.color,
                conn.thickness
            );
        }
        self.out.push_str("</g>\n");
    }

    fn lines(&mut self) {
        let c = self.canvas;
        let layout = self.layout;
        let from_parent_start = self.config.deriv_type == 1;
        let _ = writeln!(
            self.out,
            "\n<g inkscape:label='Lines' inkscape:groupmode='layer' id='layer_lines' \
             style='fill:none;stroke-width:{};'>",
            c.line_px
        );
        for n in &layout.nodes {
            let start_x = c.px(n.node.start);
            let y = c.lane_y(n.lane);
            let _ = write!(self.out, "  <path id='__line_{}' d='M ", xml_id(&n.node.name));
            if let Some(parent) = n.parent.map(|p| &layout.nodes[p]) {
                let sign = if n.lane < parent.lane { 1 } else { -1 };
                let parent_y = c.lane_y(parent.lane) - sign * c.line_px / 2;
                let fork_x = if from_parent_start {
                    c.px(parent.node.start)
                } else {
                    start_x
                };
                let _ = write!(self.out, "{fork_x} {parent_y} L ");
            }
            let _ = write!(
                self.out,
                "{start_x} {y} L {} {y}' stroke='{}'",
                c.px(n.node.stop),
                n.node.color
            );
            if n.node.stop < layout.end_of_time {
                let _ = write!(
                    self.out,
                    " marker-end='url(#__stop_{})'",
                    xml_id(&n.node.name)
                );
            }
            self.out.push_str(" />\n");
        }
        self.out.push_str("</g>\n");
    }

    fn dots(&mut self) {
        let c = self.canvas;
        let layout = self.layout;
        let cfg = self.config;
        let ring = cfg.dot_type == 1;
        let style = if ring {
            format!(
                "stroke-width:{};fill:{};",
                cfg.line_width / 2,
                cfg.main_background
            )
        } else {
            "stroke:none;".to_string()
        };
        let _ = writeln!(
            self.out,
            "\n<g inkscape:label='Dots' inkscape:groupmode='layer' id='layer_dots' style='{style}'>"
        );
        for n in &layout.nodes {
            let props = if ring {
                format!("stroke='{}'", n.node.color)
            } else {
                format!("fill='{}' stroke='none'", n.node.color)
            };
            let y = c.lane_y(n.lane);
            let _ = writeln!(
                self.out,
                "  <circle id='__dot_{}' cx='{}' cy='{y}' r='{}' {props} />",
                xml_id(&n.node.name),
                c.px(n.node.start),
                cfg.dot_radius
            );
            for change in &n.node.name_changes {
                let _ = writeln!(
                    self.out,
                    "    <circle cx='{}' cy='{y}' r='{}' {props} />",
                    c.px(change.date),
                    cfg.small_dot_radius
                );
            }
        }
        self.out.push_str("</g>\n");
    }

    /// Counter-rotation keeping an icon upright in the oriented group.
    fn upright(&self, x: i32, y: i32, width: i32) -> String {
        match self.canvas.orientation {
            Orientation::LeftToRight => String::new(),
            Orientation::TopToBottom => {
                format!("rotate(-90,{},{}) ", x + width / 2, y + width / 2)
            }
            Orientation::RightToLeft => {
                format!("matrix(-1,0,0,1,0,1) translate(-{},0) ", 2 * x + width)
            }
            Orientation::BottomToTop => {
                format!("rotate(90,{},{}) ", x + width / 2, y + width / 2)
            }
        }
    }

    fn icons(&mut self) {
        let c = self.canvas;
        let layout = self.layout;
        let icons = self.icons;
        self.out
            .push_str("\n<g inkscape:label='Icons' inkscape:groupmode='layer' id='layer_icons'>\n");
        for (n, icon) in layout.nodes.iter().zip(icons) {
            let Some(icon) = icon else {
                continue;
            };
            let (w, h) = icon.size();
            let x = c.px(n.node.start) - w / 2;
            let y = c.lane_y(n.lane) - h / 2;
            let rotate = self.upright(x, y, w);
            match icon {
                Asset::Svg(SvgAsset { body, .. }) => {
                    let _ = write!(
                        self.out,
                        "  <g transform='{rotate}translate({x},{y})'>\n{body}  </g>\n"
                    );
                }
                Asset::Png(png) => {
                    let _ = write!(
                        self.out,
                        "  <image id='__icon_{}'{} x='{x}' y='{y}' width='{w}' height='{h}'\n    \
                         xlink:href='data:image/png;base64,{}' />\n",
                        xml_id(&n.node.name),
                        transform_attr(rotate.trim_end()),
                        png.base64
                    );
                }
            }
        }
        self.out.push_str("</g>\n");
    }

    fn open_link(&mut self, target: &str) {
        if self.config.description_type == 1 {
            self.out.push_str("<a xlink:href='");
            escape_xml_into(&mut self.out, target);
            self.out.push_str("'>");
        }
    }

    fn close_link(&mut self) {
        if self.config.description_type == 1 {
            self.out.push_str("</a>");
        }
    }

    fn label_background(&mut self, x: i32, y: i32, width: i32, font: FontBox) {
        let opacity = self.config.label_bg_opacity;
        if opacity <= 0 {
            return;
        }
        let _ = writeln!(
            self.out,
            "  <rect x='{x}' y='{}' width='{width}' height='{}' fill='{}' opacity='{}' rx='5' ry='5' />",
            y - font.ex * 6 / 5,
            font.ex * 7 / 5,
            self.config.main_background,
            f64::from(opacity) / 100.0
        );
    }

    fn text(&mut self, x: i32, y: i32, centered: bool, content: &str) {
        let anchor = if centered {
            " style='text-anchor:middle;'"
        } else {
            ""
        };
        let _ = write!(self.out, "<text x='{x}' y='{y}'{anchor}>");
        escape_xml_into(&mut self.out, content);
        self.out.push_str("</text>");
    }

    fn labels(&mut self, retransform: &str) {
        let c = self.canvas;
        let layout = self.layout;
        let cfg = self.config;
        let font = FontBox::new(cfg.label_font_size, cfg.font_correction_factor);
        let family = escape_xml(&cfg.label_font);
        let transform = transform_attr(retransform);
        let _ = writeln!(
            self.out,
            "\n<g inkscape:label='Labels' inkscape:groupmode='layer' id='layer_labels'{transform} \
             style='font-size:{}px;stroke:none;fill:{};font-family:{family};-inkscape-font-specification:{family};'>",
            cfg.label_font_size, cfg.label_font_color
        );

        for n in &layout.nodes {
            let name = n.node.display_name();
            let name_w = text_width(name);
            let start = c.px(n.node.start);
            let lane_y = c.lane_y(n.lane);

            let mut x = start + cfg.dot_radius;
            let mut y = lane_y - font.ex / 2;
            let mut name_end = x + name_w * (font.em + 1);
            let mut bg_x = x - font.em / 4;
            let mut centered = false;
            match c.orientation {
                Orientation::LeftToRight => {}
                Orientation::TopToBottom => {
                    x = lane_y;
                    y = start - cfg.dot_radius - font.ex / 5;
                    bg_x = x - name_w * font.em / 2;
                    centered = true;
                }
                Orientation::RightToLeft => {
                    x = c.width - x - name_w * font.em;
                    bg_x = c.width - bg_x - name_w * font.em;
                }
                Orientation::BottomToTop => {
                    x = lane_y;
                    y = c.canvas_height - (start - cfg.dot_radius - font.ex * 7 / 5);
                    bg_x = x - name_w * font.em / 2;
                    centered = true;
                }
            }

            self.label_background(bg_x, y, name_w * font.em, font);
            self.out.push_str("  ");
            self.open_link(&n.node.description);
            self.text(x, y, centered, name);
            self.close_link();
            self.out.push('\n');

            for change in &n.node.name_changes {
                let change_w = text_width(&change.new_name);
                let at = c.px(change.date);
                let on_dot = cfg.name_change_type == 1;
                if on_dot {
                    x = at;
                    y = lane_y + font.ex / 2;
                } else {
                    x = (at + cfg.small_dot_radius).max(name_end);
                    name_end = x + change_w * (font.em + 1);
                }

                match c.orientation {
                    Orientation::LeftToRight => {}
                    Orientation::TopToBottom => {
                        x = lane_y + cfg.small_dot_radius;
                        y = at - cfg.small_dot_radius;
                        if on_dot {
                            x -= cfg.small_dot_radius;
                            y += cfg.small_dot_radius + font.ex / 2;
                        }
                    }
                    Orientation::RightToLeft => {
                        x = c.width - x - change_w * font.em;
                    }
                    Orientation::BottomToTop => {
                        x = lane_y + cfg.small_dot_radius;
                        y = c.canvas_height - (at + cfg.small_dot_radius / 2);
                        if on_dot {
                            x -= cfg.small_dot_radius;
                            y += cfg.small_dot_radius / 2 + font.ex / 2;
                        }
                    }
                }

                if !on_dot {
                    self.label_background(x - font.em / 4, y, change_w * font.em, font);
                }
                self.out.push_str("    ");
                self.open_link(&change.description);
                self.text(x, y, on_dot, &change.new_name);
                self.close_link();
                self.out.push('\n');
            }
        }
        self.out.push_str("</g>\n");
    }

    fn year_bars(&mut self, retransform: &str) {
        let c = self.canvas;
        let layout = self.layout;
        let cfg = self.config;
        let transform = transform_attr(retransform);
        let _ = writeln!(
            self.out,
            "\n<g inkscape:label='Yearlines' inkscape:groupmode='layer' id='layer_yearlines'{transform} \
             style='stroke:none;fill:url(#__yearline);'>"
        );
        let bar = cfg.year_line_px;
        if bar > 0 {
            let font = FontBox::new(cfg.year_line_font_size, cfg.font_correction_factor);
            let family = escape_xml(&cfg.year_line_font);
            let margin = 3 * c.offset_px / 2;
            let x = c.x_px - 10;
            let w = c.width - c.x_px + 10;
            let _ = write!(
                self.out,
                "  <rect x='{x}' y='{}' rx='5' ry='5' width='{w}' height='{bar}' />\n  \
                 <rect x='{x}' y='{}' rx='5' ry='5' width='{w}' height='{bar}' />\n  \
                 <g style='font-size:{}px;stroke:none;fill:{};font-family:{family};\
                 -inkscape-font-specification:{family};text-anchor:middle;'>\n",
                c.top - bar - margin,
                c.height - bar,
                cfg.year_line_font_size,
                cfg.year_line_font_color
            );
            let top_y = c.top - margin - bar / 2 + font.ex / 2;
            let bottom_y = c.height - bar / 2 + font.ex / 2;
            for i in 0..c.years {
                let x = c.year_px * i + c.year_px / 2 + c.x_px;
                let year = if c.orientation == Orientation::RightToLeft {
                    layout.end_of_time.year - i
                } else {
                    layout.beginning_of_time.year + i
                };
                let _ = write!(
                    self.out,
                    "    <text x='{x}' y='{top_y}'><tspan>{year}</tspan></text>\n    \
                     <text x='{x}' y='{bottom_y}'><tspan>{year}</tspan></text>\n"
                );
            }
            self.out.push_str("  </g>\n");
        }
        self.out.push_str("</g>\n");
    }

    fn info_box(&mut self) {
        let c = self.canvas;
        let cfg = self.config;
        let title_font = FontBox::new(cfg.info_box_title_size, cfg.font_correction_factor);
        let line_step = (f64::from(cfg.info_box_text_size) / 1.375
            * cfg.font_correction_factor
            * 1.8) as i32;
        let x = c.info_box_x + title_font.ex / 2;
        let y = c.info_box_y + title_font.ex * 5 / 3;
        let family = escape_xml(&cfg.info_box_font);
        let _ = write!(
            self.out,
            "\n<g inkscape:label='Infobox' inkscape:groupmode='layer' id='layer_infobox' \
             style='stroke:none;fill:{};font-family:{family};-inkscape-font-specification:{family};'>\n  \
             <rect x='{bx}' y='{by}' width='{bw}' height='{bh}' rx='10' ry='10' fill='{shadow}' filter='url(#__infobox_shadow)' opacity='0.6' />\n  \
             <rect x='{bx}' y='{by}' width='{bw}' height='{bh}' rx='10' ry='10' fill='url(#__infobox_fill)' stroke='url(#__infobox_stroke)' stroke-width='2' />\n",
            cfg.info_box_font_color,
            bx = c.info_box_x,
            by = c.info_box_y,
            bw = cfg.info_box_width,
            bh = cfg.info_box_height,
            shadow = Color::rgb(0, 0, 0)
        );
        if cfg.info_box_title_size > 0 {
            let _ = write!(
                self.out,
                "  <text x='{x}' y='{y}'><tspan style='font-size:{}px;font-weight:bold;'>{}</tspan></text>\n",
                cfg.info_box_title_size,
                escape_xml(&cfg.info_box_title)
            );
        }
        if cfg.info_box_text_size > 0 {
            for (i, line) in cfg.info_box_text.iter().enumerate() {
                let row = i32::try_from(i).unwrap_or(i32::MAX);
                let _ = write!(
                    self.out,
                    "  <text x='{x}' y='{}'><tspan style='font-size:{}px;'>{}</tspan></text>\n",
                    y + title_font.ex + line_step.saturating_mul(row),
                    cfg.info_box_text_size,
                    escape_xml(line)
                );
            }
        }
        self.out.push_str("</g>\n");
    }

    fn included_images(&mut self) {
        let c = self.canvas;
        let layout = self.layout;
        let images = self.images;
        self.out.push_str("\n<!-- BEGIN additional images -->\n");

        self.out.push_str(
            "\n<g inkscape:label='Included PNG Images' inkscape:groupmode='layer' id='layer_included_png'>\n",
        );
        for (i, (img, asset)) in layout.images.iter().zip(images).enumerate() {
            if let Asset::Png(png) = asset {
                let _ = write!(
                    self.out,
                    "  <image id='__png_{i}' x='{}' y='{}' width='{}' height='{}'\n    \
                     xlink:href='data:image/png;base64,{}' />\n",
                    img.x + c.x_px,
                    img.y + c.top,
                    png.width,
                    png.height,
                    png.base64
                );
            }
        }
        self.out.push_str("</g>\n");

        self.out.push_str(
            "\n<g inkscape:label='Included SVG Images' inkscape:groupmode='layer' id='layer_included_svg'>\n",
        );
        for (img, asset) in layout.images.iter().zip(images) {
            if let Asset::Svg(svg) = asset {
                let _ = write!(
                    self.out,
                    "  <g transform='translate({},{})'>\n{}  </g>\n",
                    img.x + c.x_px,
                    img.y + c.top,
                    svg.body
                );
            }
        }
        self.out.push_str("</g>\n\n<!-- END additional images -->\n");
    }
}

fn transform_attr(transform: &str) -> String {
    if transform.is_empty() {
        String::new()
    } else {
        format!(" transform='{transform}'")
    }
}
