//! Meeting links for the video-call action.

use url::Url;

/// Meetings are hosted here; the meeting ID is the first path segment.
pub const MEETING_BASE_URL: &str = "https://meet.google.com/";

/// Opens a URL outside the workspace, e.g. in a new browser window.
pub trait LinkOpener {
    fn open_link(&mut self, url: &Url);
}

/// Build the meeting URL for `meeting_id`, or `None` if the ID is blank.
pub fn meeting_url(meeting_id: &str) -> Option<Url> {
    let id = meeting_id.trim();
    if id.is_empty() {
        return None;
    }
    let mut url = Url::parse(MEETING_BASE_URL).ok()?;
    url.path_segments_mut().ok()?.pop_if_empty().push(id);
    Some(url)
}
