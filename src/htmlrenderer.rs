//! Rebuilds properly nested HTML from the flat run sequence produced by
//! [`crate::content::linearize`]. A single linear pass classifies each
//! run by the block kind of its root tag and by where it sits inside its
//! block (start, middle, end, or the block's only run), then decides
//! whether to open, continue, or close an element. For well-formed input
//! every opened tag is closed exactly once, in document order.

use crate::content::{Boundary, Run, RunSequence, Warning, Window};
use html_escape::{encode_double_quoted_attribute, encode_text};
use std::fmt::{self, Write};

/// The container wrapping code blocks, styled the way the site's
/// stylesheet expects.
const CODE_CONTAINER_OPEN: &str = "<div class=\"is-inline-block \
has-text-weight-light has-background-light p-5 mb-6\">";

/// The block kinds the renderer knows how to emit. Decided once per run
/// from `tag_path[0]`.
#[derive(Clone, Copy, Debug, PartialEq)]
enum BlockKind {
    Paragraph,
    Code,
    Unknown,
}

impl BlockKind {
    fn from_tag(tag: &str) -> BlockKind {
        match tag {
            "p" => BlockKind::Paragraph,
            "code" => BlockKind::Code,
            _ => BlockKind::Unknown,
        }
    }
}

/// Renders content [`Run`]s into HTML. All state is scoped to one
/// [`push_html`] call, so rendering one article can never leak into the
/// next.
struct HtmlRenderer {
    /// Whether an inline link is currently open. Link runs alternate:
    /// the first carries the href and opens the anchor, the second
    /// carries the visible text and closes it.
    open_anchor: bool,

    /// Set when a malformed link shape was detected; anchor handling is
    /// abandoned for the remainder of the block and link runs degrade to
    /// plain text.
    suppress_anchors: bool,

    warnings: Vec<Warning>,
}

impl HtmlRenderer {
    fn new() -> Self {
        HtmlRenderer {
            open_anchor: false,
            suppress_anchors: false,
            warnings: Vec::new(),
        }
    }

    fn on_run<W: Write>(&mut self, w: &mut W, window: &Window) -> fmt::Result {
        let run = window.run;
        let boundary = window.boundary();

        let root_tag = match run.tag_path.first() {
            Some(tag) => tag,
            // The linearizer never emits an empty tag path.
            None => return Ok(()),
        };

        match BlockKind::from_tag(root_tag) {
            BlockKind::Paragraph => self.on_paragraph(w, run, boundary)?,
            BlockKind::Code => Self::on_code(w, run, boundary)?,
            BlockKind::Unknown => {
                if let Boundary::Start | Boundary::Whole = boundary {
                    self.warnings.push(Warning::UnknownBlock {
                        tag: root_tag.clone(),
                    });
                }
            }
        }

        // Anchor state is block-scoped.
        if let Boundary::End | Boundary::Whole = boundary {
            self.open_anchor = false;
            self.suppress_anchors = false;
        }
        Ok(())
    }

    fn on_paragraph<W: Write>(
        &mut self,
        w: &mut W,
        run: &Run,
        boundary: Boundary,
    ) -> fmt::Result {
        // A link inside a link can't be paired back up; keep the first
        // link, drop the inner open, and stop tracking anchors until the
        // block ends.
        if run.anchor_depth() > 1 && !self.suppress_anchors {
            self.warnings.push(Warning::NestedAnchor {
                href: run.value.clone(),
            });
            self.suppress_anchors = true;
        }
        let linking = run.ends_in_anchor() && !self.suppress_anchors;
        let text = encode_text(&run.value);

        match boundary {
            Boundary::Whole => write!(w, "<p>{}</p>", text),
            Boundary::Start => {
                if linking {
                    self.open_anchor = true;
                    write!(
                        w,
                        "<p><a href=\"{}\">",
                        encode_double_quoted_attribute(&run.value),
                    )
                } else {
                    write!(w, "<p>{}", text)
                }
            }
            Boundary::Middle => {
                if linking && self.open_anchor {
                    self.open_anchor = false;
                    write!(w, "{}</a>", text)
                } else if linking {
                    self.open_anchor = true;
                    write!(
                        w,
                        "<a href=\"{}\">",
                        encode_double_quoted_attribute(&run.value),
                    )
                } else {
                    write!(w, "{}", text)
                }
            }
            Boundary::End => {
                if linking && self.open_anchor {
                    write!(w, "{}</a></p>", text)
                } else if self.open_anchor {
                    // The open link never got its text run; close it
                    // before the paragraph so the output stays
                    // well-formed.
                    self.warnings.push(Warning::DanglingAnchor);
                    write!(w, "</a>{}</p>", text)
                } else {
                    write!(w, "{}</p>", text)
                }
            }
        }
    }

    /// Code blocks nest no inline structure: one container, every line
    /// wrapped in its own paragraph.
    fn on_code<W: Write>(w: &mut W, run: &Run, boundary: Boundary) -> fmt::Result {
        let line = encode_text(&run.value);
        match boundary {
            Boundary::Whole => {
                write!(w, "{}<p>{}</p></div>", CODE_CONTAINER_OPEN, line)
            }
            Boundary::Start => write!(w, "{}<p>{}</p>", CODE_CONTAINER_OPEN, line),
            Boundary::Middle => write!(w, "<p>{}</p>", line),
            Boundary::End => write!(w, "<p>{}</p></div>", line),
        }
    }
}

/// Renders a [`RunSequence`] into `out` and returns the warnings raised
/// along the way. The renderer is constructed fresh on every call;
/// callers never need to reset anything between articles.
pub fn push_html<W: Write>(
    out: &mut W,
    runs: &RunSequence,
) -> Result<Vec<Warning>, fmt::Error> {
    let mut renderer = HtmlRenderer::new();
    for window in runs.windows() {
        renderer.on_run(out, &window)?;
    }
    Ok(renderer.warnings)
}
