use super::host::{MediaHandle, MediaHost};
use super::{MountGuard, VideoProvider};
use crate::config::ProviderKind;
use crate::surface::{Element, Node, Surface};

/// A native media element playing a file URL.
#[derive(Debug)]
pub struct DirectFile {
    url: String,
    guard: MountGuard,
    media: Option<MediaHandle>,
}

impl DirectFile {
    pub fn new(url: &str) -> Self {
        Self {
            url: url.trim().to_string(),
            guard: MountGuard::default(),
            media: None,
        }
    }

    fn video_element(&self) -> Element {
        let mut video = Element::new("video")
            .with_attr("src", &self.url)
            .with_attr("controls", "")
            .with_attr("autoplay", "");
        video.set_style("width", "100%");
        video.set_style("height", "100%");
        video.set_style("object-fit", "contain");
        video.set_style("background-color", "#000");
        video
    }
}

impl VideoProvider for DirectFile {
    fn kind(&self) -> ProviderKind {
        ProviderKind::DirectFile
    }

    fn identifier(&self) -> &str {
        &self.url
    }

    fn mount(&mut self, surface: &mut Surface, host: &mut dyn MediaHost, now: u64) -> bool {
        if !self.guard.begin(self.kind()) {
            return false;
        }
        surface.clear();
        if self.url.is_empty() {
            tracing::warn!("direct provider has no URL, nothing to mount");
            return true;
        }
        surface.append(Node::Element(self.video_element()));
        self.media = Some(host.attach_media(&self.url, now));
        true
    }

    fn unmount(&mut self, surface: &mut Surface, host: &mut dyn MediaHost) {
        if !self.guard.end(self.kind()) {
            return;
        }
        if let Some(media) = self.media.take() {
            host.release_media(media);
        }
        surface.clear();
    }

    fn is_mounted(&self) -> bool {
        self.guard.is_mounted()
    }

    fn poll_elapsed_seconds(&mut self, host: &mut dyn MediaHost, now: u64) -> Option<f64> {
        host.media_position(self.media?, now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::HeadlessHost;

    const URL: &str = "https://cdn.example.com/live/replay.mp4";

    #[test]
    fn test_mount_builds_video_element() {
        let mut host = HeadlessHost::instant();
        let mut surface = Surface::new();
        let mut direct = DirectFile::new(URL);
        assert!(direct.mount(&mut surface, &mut host, 0));
        assert_eq!(
            surface.to_html(),
            format!(
                "<video src=\"{URL}\" controls autoplay \
                 style=\"width:100%;height:100%;object-fit:contain;background-color:#000\"></video>"
            )
        );
        assert_eq!(host.live_media(), 1);
    }

    #[test]
    fn test_position_follows_playback() {
        let mut host = HeadlessHost::new(0, 500);
        let mut surface = Surface::new();
        let mut direct = DirectFile::new(URL);
        assert_eq!(direct.poll_elapsed_seconds(&mut host, 0), None);
        direct.mount(&mut surface, &mut host, 1000);
        assert_eq!(direct.poll_elapsed_seconds(&mut host, 1200), None);
        assert_eq!(direct.poll_elapsed_seconds(&mut host, 3500), Some(2.0));
        direct.unmount(&mut surface, &mut host);
        assert_eq!(direct.poll_elapsed_seconds(&mut host, 4000), None);
        assert_eq!(host.released(), 1);
    }
}
