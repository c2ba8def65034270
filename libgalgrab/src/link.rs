/// The ordered set of detail-page links discovered on one target page.
/// Discovery order is document order, and it fixes each link's one-based
/// position, which in turn fixes the name of the file its image lands in.
#[derive(Debug)]
pub struct LinkSet {
    links: Vec<String>,
    pad_width: usize,
}

impl LinkSet {
    pub fn new(links: Vec<String>) -> Self {
        let pad_width = digit_count(links.len());
        Self { links, pad_width }
    }

    pub fn len(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.links.iter().map(String::as_str)
    }

    /// Output file name for the link at `index` (zero-based): its one-based
    /// position, left-padded with zeros to the width of the link count, with
    /// a fixed `.jpg` extension. E.g the 3rd of 120 links => `003.jpg`.
    pub fn file_name(&self, index: usize) -> String {
        format!("{:0width$}.jpg", index + 1, width = self.pad_width)
    }
}

/// Number of decimal digits in `n`.
fn digit_count(n: usize) -> usize {
    n.to_string().len()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pad_width_follows_link_count() {
        let single = LinkSet::new(vec!["a".into()]);
        assert_eq!(single.file_name(0), "1.jpg");

        let nine = LinkSet::new(vec!["a".into(); 9]);
        assert_eq!(nine.file_name(8), "9.jpg");

        let ten = LinkSet::new(vec!["a".into(); 10]);
        assert_eq!(ten.file_name(0), "01.jpg");
        assert_eq!(ten.file_name(9), "10.jpg");

        let hundred = LinkSet::new(vec!["a".into(); 100]);
        assert_eq!(hundred.file_name(0), "001.jpg");
        assert_eq!(hundred.file_name(99), "100.jpg");
    }

    #[test]
    fn file_names_are_unique_and_sorted() {
        let links = LinkSet::new(vec!["a".into(); 12]);
        let names = (0..links.len())
            .map(|i| links.file_name(i))
            .collect::<Vec<_>>();
        for pair in names.windows(2) {
            assert!(pair[0] < pair[1], "{} should sort before {}", pair[0], pair[1]);
        }
    }

    #[test]
    fn iteration_preserves_discovery_order() {
        let links = LinkSet::new(vec!["first".into(), "second".into(), "third".into()]);
        let collected = links.iter().collect::<Vec<_>>();
        assert_eq!(collected, vec!["first", "second", "third"]);
        assert_eq!(links.len(), 3);
        assert!(!links.is_empty());
    }
}
