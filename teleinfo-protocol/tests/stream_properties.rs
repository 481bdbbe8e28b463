//! Property tests for the frame parser over generated meter streams

use proptest::prelude::*;
use teleinfo_protocol::{checksum, Dataset, DatasetEvent, EventSink, FrameError, FrameParser};

const STX: u8 = 0x02;
const ETX: u8 = 0x03;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Seen {
    Dataset(String, String),
    End,
    Checksum,
}

#[derive(Default)]
struct Collect {
    seen: Vec<Seen>,
    errors: Vec<FrameError>,
}

impl EventSink for Collect {
    fn on_event(&mut self, event: DatasetEvent<'_>) {
        self.seen.push(match event {
            DatasetEvent::Dataset(ds) => Seen::Dataset(ds.label.into(), ds.data.into()),
            DatasetEvent::EndOfTransmission => Seen::End,
            DatasetEvent::ChecksumError { .. } => Seen::Checksum,
        });
    }

    fn on_error(&mut self, error: FrameError) {
        self.errors.push(error);
    }
}

fn label() -> impl Strategy<Value = String> {
    "[A-Z][A-Z0-9]{0,7}"
}

fn data() -> impl Strategy<Value = String> {
    "[A-Z0-9.]{0,12}"
}

fn encode(label: &str, data: &str, out: &mut Vec<u8>) {
    let ds = Dataset::new(label, data).unwrap();
    out.extend_from_slice(&ds.encode_to_vec().unwrap());
}

fn frame(datasets: &[(String, String)]) -> Vec<u8> {
    let mut out = vec![STX];
    for (l, d) in datasets {
        encode(l, d, &mut out);
    }
    out.push(ETX);
    out
}

proptest! {
    #[test]
    fn chunking_does_not_change_events(
        frames in prop::collection::vec(prop::collection::vec((label(), data()), 0..6), 1..4),
        cuts in prop::collection::vec(any::<prop::sample::Index>(), 0..8),
    ) {
        let mut stream = Vec::new();
        let mut expected = Vec::new();
        for datasets in &frames {
            stream.extend_from_slice(&frame(datasets));
            for (l, d) in datasets {
                expected.push(Seen::Dataset(l.clone(), d.clone()));
            }
            expected.push(Seen::End);
        }

        let mut whole = Collect::default();
        FrameParser::new().feed_bytes(&stream, &mut whole);
        prop_assert_eq!(&whole.seen, &expected);
        prop_assert!(whole.errors.is_empty());

        let mut points: Vec<usize> = cuts.iter().map(|i| i.index(stream.len() + 1)).collect();
        points.sort_unstable();

        let mut chunked = Collect::default();
        let mut parser = FrameParser::new();
        let mut start = 0;
        for point in points {
            parser.feed_bytes(&stream[start..point], &mut chunked);
            start = point;
        }
        parser.feed_bytes(&stream[start..], &mut chunked);

        prop_assert_eq!(chunked.seen, whole.seen);
    }

    #[test]
    fn valid_checksum_yields_one_dataset(l in label(), d in data()) {
        let mut stream = vec![STX];
        stream.extend_from_slice(l.as_bytes());
        stream.push(b' ');
        stream.extend_from_slice(d.as_bytes());
        stream.push(b' ');
        stream.push(checksum(l.as_bytes(), d.as_bytes()));
        stream.push(b'\r');
        stream.insert(1, b'\n');

        let mut sink = Collect::default();
        FrameParser::new().feed_bytes(&stream, &mut sink);

        prop_assert_eq!(sink.seen, vec![Seen::Dataset(l, d)]);
        prop_assert!(sink.errors.is_empty());
    }

    #[test]
    fn corrupted_checksum_yields_one_error(
        l in label(),
        d in data(),
        corrupt in 0x20u8..0x7F,
    ) {
        let good = checksum(l.as_bytes(), d.as_bytes());
        prop_assume!(corrupt != good);

        let mut stream = vec![STX];
        encode(&l, &d, &mut stream);
        let checksum_idx = stream.len() - 2;
        stream[checksum_idx] = corrupt;

        let mut sink = Collect::default();
        FrameParser::new().feed_bytes(&stream, &mut sink);

        prop_assert_eq!(sink.seen, vec![Seen::Checksum]);
    }
}

#[test]
fn data_boundary_at_twelve_characters() {
    let mut sink = Collect::default();
    let mut parser = FrameParser::new();

    let mut stream = vec![STX];
    encode("ADCO", "123456789012", &mut stream);
    parser.feed_bytes(&stream, &mut sink);
    assert_eq!(
        sink.seen,
        vec![Seen::Dataset("ADCO".into(), "123456789012".into())]
    );

    parser.feed_bytes(b"\nADCO 1234567890123 G\r", &mut sink);
    assert_eq!(sink.seen.len(), 1);
    assert_eq!(sink.errors, vec![FrameError::DataOverflow]);
}
