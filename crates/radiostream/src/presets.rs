//! Built-in station presets

/// A named station URL
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Preset {
    pub name: &'static str,
    pub url: &'static str,
}

const fn preset_entry(name: &'static str, url: &'static str) -> Preset {
    Preset { name, url }
}

pub const PRESETS: &[Preset] = &[
    preset_entry("NPO Radio1", "http://icecast.omroep.nl/radio1-bb-mp3"),
    preset_entry("NPO Radio2", "http://icecast.omroep.nl/radio2-bb-mp3"),
    preset_entry("NPO Radio2 Soul&Jazz", "http://icecast.omroep.nl/radio6-bb-mp3"),
    preset_entry("NPO 3FM", "http://icecast.omroep.nl/3fm-bb-mp3"),
    preset_entry("NPO 3FM Alternative", "http://icecast.omroep.nl/3fm-alternative-mp3"),
    preset_entry("NPO Radio4", "http://icecast.omroep.nl/radio4-bb-mp3"),
    preset_entry("NPO Radio5", "http://icecast.omroep.nl/radio5-bb-mp3"),
    preset_entry("538 Dance Department", "http://22193.live.streamtheworld.com/TLPSTR01.mp3"),
    preset_entry("Absoluut FM", "http://absoluutfm.stream.laut.fm/absoluutfm"),
    preset_entry("Amsterdam Funk Channel", "http://stream.afc.fm:8504/stream"),
    preset_entry("Radio 10 Disco Classics", "http://19993.live.streamtheworld.com/RADIO10.mp3"),
    preset_entry("Sublime Soul", "http://20863.live.streamtheworld.com/SUBLIMESOUL.mp3"),
    preset_entry("XXL Stenders", "http://streams.robstenders.nl:8063/bonanza_mp3"),
    preset_entry("RadioEins", "http://radioeins.de/stream"),
    preset_entry("BBC radio 1", "http://stream.live.vc.bbcmedia.co.uk/bbc_radio_one"),
    preset_entry("BBC radio 2", "http://stream.live.vc.bbcmedia.co.uk/bbc_radio_two"),
    preset_entry("BBC radio 3", "http://stream.live.vc.bbcmedia.co.uk/bbc_radio_three"),
    preset_entry("BBC radio 4", "http://stream.live.vc.bbcmedia.co.uk/bbc_radio_fourfm"),
    preset_entry(
        "BBC radio 5",
        "http://stream.live.vc.bbcmedia.co.uk/bbc_radio_five_live_online_nonuk",
    ),
    preset_entry("BBC radio 6", "http://stream.live.vc.bbcmedia.co.uk/bbc_6music"),
    preset_entry("DI Radio Digital Impulse - Techno", "http://5.39.71.159:8938/"),
    preset_entry("DI Radio Digital Impulse - House", "http://5.39.71.159:8986/"),
    preset_entry("DI Radio Digital Impulse - DKR TecHouse", "http://5.39.71.159:8243/"),
    preset_entry("Tekno1", "http://tekno1.radioca.st/"),
];

/// Preset at `index`, if any
pub fn preset(index: usize) -> Option<&'static Preset> {
    PRESETS.get(index)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup() {
        assert_eq!(preset(0).map(|p| p.name), Some("NPO Radio1"));
        assert!(preset(PRESETS.len()).is_none());
    }

    #[test]
    fn every_preset_is_http() {
        for p in PRESETS {
            assert!(p.url.starts_with("http://") || p.url.starts_with("https://"), "{}", p.name);
            assert!(!p.name.is_empty());
        }
    }
}
