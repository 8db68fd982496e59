//! Tag classifier: incremental reasoning/answer partitioning.
//!
//! Models may embed reasoning inline in what the transport labels plain
//! answer content, delimited by an open and a close marker. Fragments
//! arrive with arbitrary boundaries, so a marker can be split across two
//! deliveries. The classifier keeps a short lookahead tail that could still
//! become a marker and classifies everything before it.
//!
//! Detection is marker-greedy: the leftmost full marker always wins over
//! reading the same bytes as plain text.

use super::marker::Marker;
use crate::config::MarkerConfig;

/// Which channel raw text is currently routed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ClassifierState {
    /// Plain answer text.
    #[default]
    Content,
    /// Inside a reasoning span.
    Reasoning,
}

/// Output of classifying one fragment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Classified {
    /// Text to append to the reasoning channel.
    pub reasoning: String,
    /// Answer slices, in order. Never contains empty strings.
    pub answer_units: Vec<String>,
}

impl Classified {
    /// Whether nothing was classified.
    pub fn is_empty(&self) -> bool {
        self.reasoning.is_empty() && self.answer_units.is_empty()
    }

    fn push_answer(&mut self, text: &str) {
        if !text.is_empty() {
            self.answer_units.push(text.to_string());
        }
    }

    fn push(&mut self, state: ClassifierState, text: &str) {
        match state {
            ClassifierState::Content => self.push_answer(text),
            ClassifierState::Reasoning => self.reasoning.push_str(text),
        }
    }
}

/// Incremental classifier for one stream.
#[derive(Debug, Clone)]
pub struct TagClassifier {
    open: Marker,
    close: Marker,
    state: ClassifierState,
    /// Unclassified lookahead. Bounded by the longer marker length minus one
    /// between calls.
    pending: String,
}

impl TagClassifier {
    /// Create a classifier for the given markers.
    pub fn new(markers: &MarkerConfig) -> Self {
        Self {
            open: Marker::new(markers.open.as_str()),
            close: Marker::new(markers.close.as_str()),
            state: ClassifierState::Content,
            pending: String::new(),
        }
    }

    /// Current state.
    #[inline]
    pub const fn state(&self) -> ClassifierState {
        self.state
    }

    /// Whether the classifier is inside a reasoning span.
    #[inline]
    pub fn is_in_reasoning(&self) -> bool {
        self.state == ClassifierState::Reasoning
    }

    /// Bytes held back as a possible partial marker.
    #[inline]
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Classify a raw fragment.
    pub fn classify(&mut self, fragment: &str) -> Classified {
        let mut out = Classified::default();
        self.pending.push_str(fragment);

        let mut tail = std::mem::take(&mut self.pending);
        let mut start = 0;

        loop {
            let rest = &tail[start..];
            let marker = match self.state {
                ClassifierState::Content => &self.open,
                ClassifierState::Reasoning => &self.close,
            };

            if let Some(at) = marker.find_in(rest) {
                out.push(self.state, &rest[..at]);
                start += at + marker.len();
                self.state = match self.state {
                    ClassifierState::Content => ClassifierState::Reasoning,
                    ClassifierState::Reasoning => ClassifierState::Content,
                };
                continue;
            }

            let keep = marker.partial_suffix_len(rest);
            let split = rest.len() - keep;
            out.push(self.state, &rest[..split]);
            start += split;
            break;
        }

        tail.drain(..start);
        self.pending = tail;
        out
    }

    /// Release the lookahead tail to whichever channel is active.
    ///
    /// Called when the stream ends. An unterminated reasoning span is not
    /// an error; its text simply stays reasoning.
    pub fn finish(&mut self) -> Classified {
        let mut out = Classified::default();
        let tail = std::mem::take(&mut self.pending);
        out.push(self.state, &tail);
        out
    }

    /// Drop the lookahead tail without classifying it.
    pub fn discard_pending(&mut self) {
        self.pending.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn classifier() -> TagClassifier {
        TagClassifier::new(&MarkerConfig::default())
    }

    /// Feed all fragments, finish, and return (reasoning, answer).
    fn run(fragments: &[&str]) -> (String, String, Vec<String>) {
        let mut c = classifier();
        let mut reasoning = String::new();
        let mut units = Vec::new();
        for fragment in fragments {
            let out = c.classify(fragment);
            reasoning.push_str(&out.reasoning);
            units.extend(out.answer_units);
        }
        let out = c.finish();
        reasoning.push_str(&out.reasoning);
        units.extend(out.answer_units);
        (reasoning, units.concat(), units)
    }

    #[test]
    fn test_plain_text_passes_through() {
        let mut c = classifier();
        let out = c.classify("Hello world");
        assert_eq!(out.answer_units, vec!["Hello world".to_string()]);
        assert!(out.reasoning.is_empty());
        assert_eq!(c.state(), ClassifierState::Content);
    }

    #[test]
    fn test_end_to_end_scenario() {
        let (reasoning, answer, _) = run(&["Hello ", "<think>reason", "ing here</think> world"]);
        assert_eq!(reasoning, "reasoning here");
        assert_eq!(answer, "Hello  world");
    }

    #[test]
    fn test_split_open_marker() {
        let mut c = classifier();
        let first = c.classify("ab<thi");
        assert_eq!(first.answer_units, vec!["ab".to_string()]);
        assert_eq!(c.pending_len(), 4);

        let second = c.classify("nk>rest");
        assert!(second.answer_units.is_empty());
        assert_eq!(second.reasoning, "rest");
        assert!(c.is_in_reasoning());
    }

    #[test]
    fn test_split_close_marker() {
        let mut c = classifier();
        c.classify("<think>deep");
        let out = c.classify(" thought</th");
        assert_eq!(out.reasoning, " thought");
        let out = c.classify("ink>answer");
        assert!(out.reasoning.is_empty());
        assert_eq!(out.answer_units, vec!["answer".to_string()]);
        assert_eq!(c.state(), ClassifierState::Content);
    }

    #[test]
    fn test_false_partial_is_released() {
        let mut c = classifier();
        let out = c.classify("a <th");
        assert_eq!(out.answer_units, vec!["a ".to_string()]);
        let out = c.classify("e end");
        assert_eq!(out.answer_units, vec!["<the end".to_string()]);
        assert_eq!(c.pending_len(), 0);
    }

    #[test]
    fn test_multiple_spans_in_one_fragment() {
        let (reasoning, answer, units) = run(&["a<think>x</think>b<think>y</think>c"]);
        assert_eq!(reasoning, "xy");
        assert_eq!(answer, "abc");
        assert_eq!(units, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_marker_one_byte_at_a_time() {
        let text = "pre<think>mid</think>post";
        let fragments: Vec<String> = text.chars().map(String::from).collect();
        let refs: Vec<&str> = fragments.iter().map(String::as_str).collect();
        let (reasoning, answer, _) = run(&refs);
        assert_eq!(reasoning, "mid");
        assert_eq!(answer, "prepost");
    }

    #[test]
    fn test_unterminated_span_flushes_to_reasoning() {
        let mut c = classifier();
        c.classify("<think>still going</th");
        let out = c.finish();
        assert_eq!(out.reasoning, "</th");
        assert!(out.answer_units.is_empty());
    }

    #[test]
    fn test_partial_open_flushes_to_answer() {
        let mut c = classifier();
        let out = c.classify("tail <thin");
        assert_eq!(out.answer_units, vec!["tail ".to_string()]);
        let out = c.finish();
        assert_eq!(out.answer_units, vec!["<thin".to_string()]);
    }

    #[test]
    fn test_empty_units_are_not_emitted() {
        let mut c = classifier();
        let out = c.classify("<think>");
        assert!(out.is_empty());
        let out = c.classify("</think>");
        assert!(out.is_empty());
        assert!(c.finish().is_empty());
    }

    #[test]
    fn test_close_marker_in_content_is_plain_text() {
        let (reasoning, answer, _) = run(&["a</think>b"]);
        assert!(reasoning.is_empty());
        assert_eq!(answer, "a</think>b");
    }

    #[test]
    fn test_multibyte_text_around_markers() {
        let (reasoning, answer, _) = run(&["你好<th", "ink>思考中</think>世界"]);
        assert_eq!(reasoning, "思考中");
        assert_eq!(answer, "你好世界");
    }

    #[test]
    fn test_discard_pending() {
        let mut c = classifier();
        c.classify("x<thi");
        c.discard_pending();
        assert_eq!(c.pending_len(), 0);
        assert!(c.finish().is_empty());
    }

    fn strip_spans(text: &str) -> (String, String) {
        let mut reasoning = String::new();
        let mut answer = String::new();
        let mut rest = text;
        loop {
            match rest.find("<think>") {
                None => {
                    answer.push_str(rest);
                    break;
                }
                Some(open) => {
                    answer.push_str(&rest[..open]);
                    rest = &rest[open + "<think>".len()..];
                    if let Some(close) = rest.find("</think>") {
                        reasoning.push_str(&rest[..close]);
                        rest = &rest[close + "</think>".len()..];
                    } else {
                        reasoning.push_str(rest);
                        break;
                    }
                }
            }
        }
        (reasoning, answer)
    }

    fn split_at_points(text: &str, mut points: Vec<usize>) -> Vec<String> {
        points.retain(|&p| text.is_char_boundary(p));
        points.sort_unstable();
        points.dedup();
        let mut out = Vec::new();
        let mut last = 0;
        for p in points {
            out.push(text[last..p].to_string());
            last = p;
        }
        out.push(text[last..].to_string());
        out
    }

    fn message() -> impl Strategy<Value = String> {
        prop::collection::vec(
            prop_oneof![
                Just("<think>".to_string()),
                Just("</think>".to_string()),
                Just("<".to_string()),
                Just("</th".to_string()),
                "[a-z ]{0,6}",
                "[é思<>/]{0,3}",
            ],
            0..12,
        )
        .prop_map(|parts| parts.concat())
    }

    proptest! {
        #[test]
        fn prop_fragmentation_invariance(
            text in message(),
            points in prop::collection::vec(0usize..80, 0..10),
        ) {
            let fragments = split_at_points(&text, points);
            let refs: Vec<&str> = fragments.iter().map(String::as_str).collect();
            let (reasoning, answer, _) = run(&refs);
            let (whole_reasoning, whole_answer, _) = run(&[text.as_str()]);
            prop_assert_eq!(&reasoning, &whole_reasoning);
            prop_assert_eq!(&answer, &whole_answer);
        }

        #[test]
        fn prop_units_concat_to_stripped_answer(
            text in message(),
            points in prop::collection::vec(0usize..80, 0..10),
        ) {
            let fragments = split_at_points(&text, points);
            let refs: Vec<&str> = fragments.iter().map(String::as_str).collect();
            let (reasoning, answer, units) = run(&refs);
            let (expected_reasoning, expected_answer) = strip_spans(&text);
            prop_assert_eq!(answer, expected_answer);
            prop_assert_eq!(reasoning, expected_reasoning);
            prop_assert!(units.iter().all(|u| !u.is_empty()));
        }
    }
}
