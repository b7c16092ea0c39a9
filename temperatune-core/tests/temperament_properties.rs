use assert_approx_eq::assert_approx_eq;
use temperatune_core::builtin::{default_temperament, temperaments};
use temperatune_core::{Temperament, TemperamentError, prettify_note_name};

const OCTAVES: std::ops::RangeInclusive<i32> = 0..=8;

fn user_temperament() -> Temperament {
    // Relations point both ways and span several octaves before normalization.
    Temperament::from_json_str(
        r#"{
            "name": "Septimal pentatonic",
            "description": "Five notes built from mixed relations",
            "referenceName": "G",
            "referencePitch": 392,
            "referenceOctave": 4,
            "octaveBaseName": "C",
            "notes": {
                "D": ["G", 1901.955],
                "G": ["C", 701.955],
                "B{flat}": ["C", 968.826],
                "F": ["B{flat}", -2898.045]
            }
        }"#,
    )
    .unwrap()
}

fn all_temperaments() -> Vec<Temperament> {
    let mut all: Vec<Temperament> = temperaments().iter().cloned().collect();
    all.push(user_temperament());
    all
}

#[test]
fn reference_note_is_exact() {
    for temperament in all_temperaments() {
        let reference = temperament.reference_name();
        let octave = temperament.reference_octave();
        assert_eq!(temperament.get_offset(reference, octave), Some(0.0));
        assert_eq!(
            temperament.get_pitch(reference, octave),
            Some(temperament.reference_pitch())
        );
    }
}

#[test]
fn pitch_doubles_every_octave() {
    for temperament in all_temperaments() {
        for note in temperament.note_names() {
            for octave in OCTAVES {
                let low = temperament.get_pitch(note, octave).unwrap();
                let high = temperament.get_pitch(note, octave + 1).unwrap();
                assert_approx_eq!(high, low * 2.0, low * 1e-12);
            }
        }
    }
}

#[test]
fn note_names_ascend_from_the_octave_base() {
    for temperament in all_temperaments() {
        let names = temperament.note_names();
        assert_eq!(names[0], temperament.octave_base_name());

        let offsets: Vec<f64> = temperament.offsets().map(|(_, offset)| offset).collect();
        assert!(offsets.windows(2).all(|pair| pair[0] <= pair[1]));

        let base = offsets[0];
        assert!(base > -1200.0 && base <= 0.0, "{}: {base}", temperament.name());
        assert!(offsets.iter().all(|&offset| offset >= base && offset < base + 1200.0));
    }
}

#[test]
fn pitches_map_back_to_their_notes() {
    for temperament in all_temperaments() {
        for note in temperament.note_names() {
            for octave in OCTAVES {
                let pitch = temperament.get_pitch(note, octave).unwrap();
                let (name, cents) = temperament.get_note_name_from_pitch(pitch).unwrap();
                assert_eq!(name, note, "{} at {pitch} Hz", temperament.name());
                assert_approx_eq!(cents, 0.0, 1e-6);

                let reading = temperament.get_note_from_pitch(pitch).unwrap();
                assert_eq!(reading.octave, octave);
            }
        }
    }
}

#[test]
fn equal_temperament_pitches() {
    let equal = default_temperament();
    assert_approx_eq!(equal.get_pitch("A", 4).unwrap(), 440.0);
    assert_approx_eq!(equal.get_pitch("A", 5).unwrap(), 880.0);
    assert_approx_eq!(equal.get_pitch("C", 5).unwrap(), 523.251, 1e-3);
    assert_approx_eq!(equal.get_pitch("F{sharp}", 4).unwrap(), 369.994, 1e-3);
    assert_eq!(equal.get_offset("A", 6), Some(2400.0));
    assert_eq!(equal.get_offset("C", 4), Some(-900.0));
    assert_eq!(prettify_note_name("F{sharp}"), "F♯");
}

#[test]
fn meantone_is_not_equally_spaced() {
    let meantone = temperaments().get("Quarter-comma meantone").unwrap();
    assert_approx_eq!(meantone.get_offset("D", 4).unwrap(), -696.6, 0.1);
    assert_approx_eq!(meantone.get_offset("C", 4).unwrap(), -889.8, 0.1);

    // Pure major third C-E
    let third = meantone.get_offset("E", 4).unwrap() - meantone.get_offset("C", 4).unwrap();
    assert_approx_eq!(third, 386.3137, 1e-3);
}

#[test]
fn user_temperament_is_folded_into_one_octave() {
    let temperament = user_temperament();
    let offsets: Vec<(&str, f64)> = temperament.offsets().collect();
    let names: Vec<&str> = offsets.iter().map(|(name, _)| *name).collect();
    assert_eq!(names, vec!["C", "D", "F", "G", "B{flat}"]);
    assert_approx_eq!(offsets[0].1, -701.955, 1e-9);
    assert_approx_eq!(offsets[1].1, -498.045, 1e-9);
    assert_approx_eq!(offsets[2].1, -231.174, 1e-9);
    assert_approx_eq!(offsets[4].1, 266.871, 1e-9);
}

#[test]
fn construction_errors() {
    let conflicting = r#"{ "name": "x", "referenceName": "A", "referencePitch": 440,
        "referenceOctave": 4, "octaveBaseName": "A",
        "notes": { "A": ["C", 400], "C": ["A", 500] } }"#;
    assert!(matches!(
        Temperament::from_json_str(conflicting),
        Err(TemperamentError::ConflictingDefinition { .. })
    ));

    let unreachable = r#"{ "name": "x", "referenceName": "A", "referencePitch": 440,
        "referenceOctave": 4, "octaveBaseName": "A",
        "notes": { "E": ["A", 700], "D": ["G", 700] } }"#;
    assert!(matches!(
        Temperament::from_json_str(unreachable),
        Err(TemperamentError::UnreachableNote { .. })
    ));

    let no_base = r#"{ "name": "x", "referenceName": "A", "referencePitch": 440,
        "referenceOctave": 4, "octaveBaseName": "C", "notes": {} }"#;
    assert!(matches!(
        Temperament::from_json_str(no_base),
        Err(TemperamentError::UndefinedOctaveBase { .. })
    ));

    let malformed = r#"{ "name": "x", "referenceName": "A", "referencePitch": 440,
        "referenceOctave": 4, "octaveBaseName": "C", "notes": { "C": ["A"] } }"#;
    assert!(matches!(
        Temperament::from_json_str(malformed),
        Err(TemperamentError::Validation { .. })
    ));
}
