pub const SCROLL_TOP_THRESHOLD: f64 = 300.0;
pub const HEADER_OFFSET: f64 = 72.0;

/// Id of the section the reader is currently in: the last one whose top edge
/// has passed under the fixed header.
pub fn active_section<'a>(
    sections: &[(&'a str, f64)],
    scroll_y: f64,
    header_offset: f64,
) -> Option<&'a str> {
    let position = scroll_y + header_offset;

    sections
        .iter()
        .filter(|(_, top)| *top <= position)
        .max_by(|(_, a), (_, b)| a.total_cmp(b))
        .map(|(id, _)| *id)
}

pub fn scroll_top_visible(scroll_y: f64) -> bool {
    scroll_y > SCROLL_TOP_THRESHOLD
}

/// Target `scrollTo` position for a section so it is not hidden by the header.
pub fn section_scroll_target(section_top: f64, header_offset: f64) -> f64 {
    (section_top - header_offset).max(0.0)
}

/// Section handles looked up once per layout. Scroll handlers only read each
/// handle's viewport offset through `viewport_top`.
#[derive(Clone, Debug)]
pub struct SectionAnchors<T> {
    sections: Vec<(&'static str, T)>,
}

impl<T> Default for SectionAnchors<T> {
    fn default() -> Self {
        Self {
            sections: Vec::new(),
        }
    }
}

impl<T> SectionAnchors<T> {
    /// Ids without a matching handle are left out.
    pub fn resolve(
        ids: impl IntoIterator<Item = &'static str>,
        mut lookup: impl FnMut(&str) -> Option<T>,
    ) -> Self {
        let sections = ids
            .into_iter()
            .filter_map(|id| lookup(id).map(|handle| (id, handle)))
            .collect();
        Self { sections }
    }

    /// Document-relative tops of every resolved section.
    pub fn tops(
        &self,
        scroll_y: f64,
        viewport_top: impl Fn(&T) -> f64,
    ) -> Vec<(&'static str, f64)> {
        self.sections
            .iter()
            .map(|(id, handle)| (*id, viewport_top(handle) + scroll_y))
            .collect()
    }

    pub fn top_of(
        &self,
        id: &str,
        scroll_y: f64,
        viewport_top: impl Fn(&T) -> f64,
    ) -> Option<f64> {
        self.sections
            .iter()
            .find(|(candidate, _)| *candidate == id)
            .map(|(_, handle)| viewport_top(handle) + scroll_y)
    }
}

pub fn skill_bar_width(percent: u8) -> String {
    format!("{}%", percent.min(100))
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ContactForm {
    pub name: String,
    pub email: String,
    pub subject: String,
    pub message: String,
}

impl ContactForm {
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.name.trim().is_empty() {
            return Err("Please enter your name.");
        }
        if self.email.trim().is_empty() {
            return Err("Please enter your email address.");
        }
        if !is_plausible_email(self.email.trim()) {
            return Err("Please enter a valid email address.");
        }
        if self.subject.trim().is_empty() {
            return Err("Please enter a subject.");
        }
        if self.message.trim().is_empty() {
            return Err("Please enter a message.");
        }

        Ok(())
    }

    pub fn confirmation(&self) -> String {
        let name = self.name.trim();
        format!("Thanks, {name}! Your message has been noted.")
    }
}

fn is_plausible_email(value: &str) -> bool {
    if value.chars().any(char::is_whitespace) {
        return false;
    }

    let Some((local, domain)) = value.split_once('@') else {
        return false;
    };

    !local.is_empty()
        && !domain.contains('@')
        && domain.split_once('.').is_some_and(|(head, tail)| {
            !head.is_empty() && !tail.is_empty() && !tail.ends_with('.')
        })
}
