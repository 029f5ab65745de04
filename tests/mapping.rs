//! End-to-end mapping properties over synthetic protein databases.

use std::collections::{BTreeMap, BTreeSet};

use protein_fm::util::amino::MASS_ROUNDING;
use protein_fm::{
    IndexConfig, MassTable, MatchingOptions, MatchingPolicy, NoProgress, ProteinIndex, ProteinMapping, TagElement,
};

struct Lcg(u64);

impl Lcg {
    fn next(&mut self) -> usize {
        self.0 = self.0.wrapping_mul(6_364_136_223_846_793_005).wrapping_add(1_442_695_040_888_963_407);
        (self.0 >> 33) as usize
    }

    fn below(&mut self, n: usize) -> usize {
        self.next() % n
    }
}

fn random_db(seed: u64, count: usize, alphabet: &[u8]) -> Vec<(String, String)> {
    let mut rng = Lcg(seed);
    (0..count)
        .map(|i| {
            let len = 20 + rng.below(40);
            let seq: String = (0..len).map(|_| alphabet[rng.below(alphabet.len())] as char).collect();
            (format!("prot{:02}", i), seq)
        })
        .collect()
}

fn build(db: &[(String, String)], config: &IndexConfig) -> ProteinIndex {
    ProteinIndex::build(
        db.iter().map(|(a, s)| (a.as_str(), s.as_str())),
        MassTable::default(),
        config,
        &NoProgress,
    )
    .unwrap()
}

type Flat = BTreeMap<String, BTreeMap<String, Vec<usize>>>;

fn flatten(mapping: &ProteinMapping) -> Flat {
    mapping
        .iter()
        .map(|(p, hits)| (p.clone(), hits.iter().map(|(a, o)| (a.clone(), o.clone())).collect()))
        .collect()
}

fn naive_scan(db: &[(String, String)], peptide: &str) -> BTreeSet<(String, usize)> {
    let mut hits = BTreeSet::new();
    for (acc, seq) in db {
        let mut from = 0;
        while let Some(pos) = seq[from..].find(peptide) {
            hits.insert((acc.clone(), from + pos));
            from += pos + 1;
        }
    }
    hits
}

fn pairs(mapping: &ProteinMapping) -> BTreeSet<(String, usize)> {
    mapping
        .values()
        .flat_map(|hits| hits.iter().flat_map(|(a, offsets)| offsets.iter().map(move |&o| (a.clone(), o))))
        .collect()
}

/// Walks `tag` over `seq` from `start`: literals must match exactly, a gap takes residues
/// until their mass first falls within `tolerance` of the target.
fn naive_tag_at(masses: &MassTable, seq: &[u8], start: usize, tag: &[TagElement], tolerance: f64) -> Option<usize> {
    let mut pos = start;
    for element in tag {
        match element {
            TagElement::Sequence(lit) => {
                let lit = lit.as_bytes();
                if seq.get(pos..pos + lit.len())? != lit {
                    return None;
                }
                pos += lit.len();
            }
            TagElement::MassGap(target) => {
                let mut mass = 0.0;
                loop {
                    mass += masses.get(*seq.get(pos)?)?;
                    pos += 1;
                    if mass > target + tolerance + MASS_ROUNDING {
                        return None;
                    }
                    if (target - mass).abs() <= tolerance + MASS_ROUNDING {
                        break;
                    }
                }
            }
        }
    }
    Some(pos)
}

fn naive_tag(db: &[(String, String)], tag: &[TagElement], tolerance: f64) -> Flat {
    let masses = MassTable::default();
    let mut out = Flat::new();
    for (acc, seq) in db {
        let seq = seq.as_bytes();
        for start in 0..seq.len() {
            if let Some(end) = naive_tag_at(&masses, seq, start, tag, tolerance) {
                let peptide = String::from_utf8_lossy(&seq[start..end]).into_owned();
                out.entry(peptide).or_default().entry(acc.clone()).or_default().push(start);
            }
        }
    }
    out
}

#[test]
fn scenario_database() {
    let db = vec![("P1".to_string(), "PEPTIDER".to_string()), ("P2".to_string(), "TIDERPEP".to_string())];
    let index = build(&db, &IndexConfig::default());
    let opt = MatchingOptions::default();

    let m = flatten(&index.map_peptide("PEPTIDE", &opt).unwrap());
    assert_eq!(m, Flat::from([("PEPTIDE".into(), BTreeMap::from([("P1".into(), vec![0])]))]));

    let m = flatten(&index.map_peptide("TIDER", &opt).unwrap());
    assert_eq!(m["TIDER"]["P1"], vec![3]);
    assert_eq!(m["TIDER"]["P2"], vec![0]);

    let m = flatten(&index.map_peptide("tiderpep", &opt).unwrap());
    assert_eq!(m["TIDERPEP"]["P2"], vec![0]);
    assert!(!m["TIDERPEP"].contains_key("P1"));
}

#[test]
fn every_substring_maps_back_to_its_origin() {
    let db = random_db(7, 6, b"ACDEFGHIKLMNPQRSTVWY");
    let sparse = IndexConfig { sampling_shift: 4, ..IndexConfig::default() };
    let index = build(&db, &sparse);
    let opt = MatchingOptions::default();

    for (acc, seq) in &db {
        for p in 0..seq.len() {
            for k in [1, 3, 8] {
                if p + k > seq.len() {
                    continue;
                }
                let peptide = &seq[p..p + k];
                let m = index.map_peptide(peptide, &opt).unwrap();
                assert!(m[peptide][acc].contains(&p), "{} at {}:{} not found", peptide, acc, p);
            }
        }
    }
}

#[test]
fn exact_mapping_equals_naive_scan() {
    // 小字母表制造大量重复
    let db = random_db(11, 12, b"ACG");
    let index = build(&db, &IndexConfig::default());
    let opt = MatchingOptions::default();

    let mut rng = Lcg(3);
    for _ in 0..200 {
        let (_, seq) = &db[rng.below(db.len())];
        let k = 1 + rng.below(6);
        let p = rng.below(seq.len() - k + 1);
        let peptide = &seq[p..p + k];
        let m = index.map_peptide(peptide, &opt).unwrap();
        assert_eq!(m.len(), 1);
        assert_eq!(pairs(&m), naive_scan(&db, peptide), "peptide {}", peptide);
    }
    assert!(index.map_peptide("W", &opt).unwrap().is_empty());
}

#[test]
fn ambiguity_code_matches_exactly_its_members() {
    let db: Vec<(String, String)> = b"ACDEFGHIKLMNPQRSTVWY"
        .iter()
        .map(|&r| (format!("with_{}", r as char), format!("MK{}GW", r as char)))
        .collect();
    let index = build(&db, &IndexConfig::default());
    let opt = MatchingOptions::with_policy(MatchingPolicy::AminoAcid);

    let m = index.map_peptide("KZG", &opt).unwrap();
    let hit: BTreeSet<String> = pairs(&m).into_iter().map(|(a, _)| a).collect();
    assert_eq!(hit, BTreeSet::from(["with_E".to_string(), "with_Q".to_string()]));
    assert_eq!(m["KEG"]["with_E"], vec![1]);

    let m = index.map_peptide("KJG", &MatchingOptions::with_policy(MatchingPolicy::Indistinguishable)).unwrap();
    let hit: BTreeSet<String> = pairs(&m).into_iter().map(|(a, _)| a).collect();
    assert_eq!(hit, BTreeSet::from(["with_I".to_string(), "with_L".to_string()]));

    // X 覆盖全部标准残基
    let m = index.map_peptide("MKXGW", &opt).unwrap();
    assert_eq!(pairs(&m).len(), 20);
    assert!(index.map_peptide("MKXGW", &MatchingOptions::default()).unwrap().is_empty());
}

#[test]
fn tag_mapping_equals_naive_walk() {
    let db = random_db(23, 15, b"ACDEGKLPSTW");
    let index = build(&db, &IndexConfig::default());
    let masses = MassTable::default();
    let opt = MatchingOptions::default();
    let tolerance = 0.005;

    let mut rng = Lcg(41);
    for round in 0..120 {
        let (_, seq) = &db[rng.below(db.len())];
        let seq = seq.as_bytes();
        let p = rng.below(seq.len() - 9);
        let gap = |range: std::ops::Range<usize>| TagElement::MassGap(masses.peptide_mass(&seq[range]).unwrap());
        let lit = |range: std::ops::Range<usize>| TagElement::Sequence(String::from_utf8_lossy(&seq[range]).into_owned());

        let tag = match round % 6 {
            0 => vec![lit(p..p + 3), gap(p + 3..p + 5)],
            1 => vec![gap(p..p + 2), lit(p + 2..p + 5)],
            2 => vec![gap(p..p + 1), lit(p + 1..p + 4), gap(p + 4..p + 7)],
            3 => vec![gap(p..p + 3), lit(p + 3..p + 5), gap(p + 5..p + 6)],
            4 => vec![lit(p..p + 2), gap(p + 2..p + 4), lit(p + 4..p + 7)],
            _ => vec![gap(p..p + 2), gap(p + 2..p + 3), lit(p + 3..p + 6), gap(p + 6..p + 8)],
        };

        let got = flatten(&index.map_tag(&tag, &opt, tolerance).unwrap());
        let expected = naive_tag(&db, &tag, tolerance);
        assert_eq!(got, expected, "tag {:?}", tag);
        assert!(!got.is_empty());
    }
}

#[test]
fn gap_only_tag_enumerates_windows() {
    let db = vec![("a".to_string(), "GGAG".to_string()), ("b".to_string(), "AGG".to_string())];
    let index = build(&db, &IndexConfig::default());
    let gg = MassTable::default().peptide_mass(b"GG").unwrap();
    let tag = [TagElement::MassGap(gg)];
    let got = flatten(&index.map_tag(&tag, &MatchingOptions::default(), 0.001).unwrap());
    assert_eq!(got, naive_tag(&db, &tag, 0.001));
    assert_eq!(got["GG"]["a"], vec![0]);
    assert_eq!(got["GG"]["b"], vec![1]);
}

#[test]
fn tolerance_window_is_inclusive() {
    let masses = MassTable::from_residues([(b'A', 50.0), (b'G', 25.0), (b'W', 200.0)]);
    let index = ProteinIndex::build([("db", "WAGA")], masses, &IndexConfig::default(), &NoProgress).unwrap();
    let opt = MatchingOptions::default();
    let tag = |m: f64| [TagElement::Sequence("W".into()), TagElement::MassGap(m)];

    // AG = 75
    for (target, tol, expect) in [(75.0, 0.0, true), (75.25, 0.25, true), (74.75, 0.25, true), (75.5, 0.25, false), (74.5, 0.25, false)] {
        let m = index.map_tag(&tag(target), &opt, tol).unwrap();
        assert_eq!(m.contains_key("WAG"), expect, "target {} tol {}", target, tol);
    }
}

#[test]
fn tolerance_edges_with_monoisotopic_masses() {
    let masses = MassTable::default();
    let db = vec![("a".to_string(), "MWGASKTEW".to_string()), ("b".to_string(), "SAGKTE".to_string())];
    let index = build(&db, &IndexConfig::default());
    let opt = MatchingOptions::default();
    let gas = masses.peptide_mass(b"GAS").unwrap();

    for tol in [0.005, 0.02, 0.1, 0.3] {
        for target in [gas - tol, gas + tol] {
            let gap = TagElement::MassGap(target);
            for tag in [
                vec![TagElement::Sequence("MW".into()), gap.clone()],
                vec![gap.clone(), TagElement::Sequence("KTE".into())],
            ] {
                let got = flatten(&index.map_tag(&tag, &opt, tol).unwrap());
                assert_eq!(got, naive_tag(&db, &tag, tol), "tag {:?} tol {}", tag, tol);
                assert!(!got.is_empty(), "tag {:?} tol {}", tag, tol);
            }
        }
        // 窗口之外
        let outside = [TagElement::MassGap(gas + 2.5 * tol), TagElement::Sequence("KTE".into())];
        assert!(index.map_tag(&outside, &opt, tol).unwrap().is_empty());
    }

    let leading = [TagElement::MassGap(gas + 0.02), TagElement::Sequence("KTE".into())];
    let got = flatten(&index.map_tag(&leading, &opt, 0.02).unwrap());
    assert_eq!(got["GASKTE"]["a"], vec![2]);
    assert_eq!(got["SAGKTE"]["b"], vec![0]);
}

#[test]
fn cache_does_not_change_results() {
    let db = random_db(5, 10, b"ACDEGKLPSTW");
    let masses = MassTable::default();
    let seq = db[3].1.as_bytes();
    let tags = vec![
        vec![
            TagElement::Sequence(String::from_utf8_lossy(&seq[4..7]).into_owned()),
            TagElement::MassGap(masses.peptide_mass(&seq[7..9]).unwrap()),
        ],
        vec![
            TagElement::MassGap(masses.peptide_mass(&seq[2..4]).unwrap()),
            TagElement::Sequence(String::from_utf8_lossy(&seq[4..7]).into_owned()),
            TagElement::MassGap(masses.peptide_mass(&seq[7..8]).unwrap()),
        ],
        vec![
            TagElement::MassGap(masses.peptide_mass(&seq[3..4]).unwrap()),
            TagElement::Sequence(String::from_utf8_lossy(&seq[4..7]).into_owned()),
            TagElement::MassGap(masses.peptide_mass(&seq[7..9]).unwrap()),
        ],
    ];

    let cached = build(&db, &IndexConfig::default());
    let uncached = build(&db, &IndexConfig { cache_capacity: 0, ..IndexConfig::default() });
    for policy in [MatchingPolicy::Exact, MatchingPolicy::AminoAcid, MatchingPolicy::Indistinguishable] {
        let opt = MatchingOptions::with_policy(policy);
        for tag in &tags {
            for tolerance in [0.01, 0.5] {
                let reference = flatten(&uncached.map_tag(tag, &opt, tolerance).unwrap());
                assert_eq!(flatten(&cached.map_tag(tag, &opt, tolerance).unwrap()), reference);
                assert_eq!(flatten(&cached.map_tag(tag, &opt, tolerance).unwrap()), reference);
            }
        }
    }
    assert!(cached.cached_entries() > 0);
    assert_eq!(uncached.cached_entries(), 0);
}

#[test]
fn separate_builds_agree() {
    let db = random_db(99, 8, b"ACDEFGHIKLMNPQRSTVWY");
    let a = build(&db, &IndexConfig::default());
    let b = build(&db, &IndexConfig::default());
    let opt = MatchingOptions::with_policy(MatchingPolicy::AminoAcid);
    let masses = MassTable::default();

    for (_, seq) in &db {
        let peptide = &seq[2..7];
        assert_eq!(flatten(&a.map_peptide(peptide, &opt).unwrap()), flatten(&b.map_peptide(peptide, &opt).unwrap()));
        let tag = [
            TagElement::Sequence(seq[2..5].to_string()),
            TagElement::MassGap(masses.peptide_mass(&seq.as_bytes()[5..7]).unwrap()),
        ];
        assert_eq!(flatten(&a.map_tag(&tag, &opt, 0.02).unwrap()), flatten(&b.map_tag(&tag, &opt, 0.02).unwrap()));
    }
    assert_eq!(a.stats().text_len, b.stats().text_len);
}

#[test]
fn concurrent_queries_match_sequential_ones() {
    let db = random_db(17, 20, b"ACDEGKLPSTW");
    let index = build(&db, &IndexConfig::default());
    let masses = MassTable::default();
    let opt = MatchingOptions::default();

    let tags: Vec<Vec<TagElement>> = db
        .iter()
        .map(|(_, seq)| {
            vec![
                TagElement::Sequence(seq[0..3].to_string()),
                TagElement::MassGap(masses.peptide_mass(&seq.as_bytes()[3..5]).unwrap()),
            ]
        })
        .collect();
    let sequential: Vec<Flat> = tags.iter().map(|t| flatten(&index.map_tag(t, &opt, 0.01).unwrap())).collect();
    index.clear_cache();

    std::thread::scope(|scope| {
        let handles: Vec<_> = (0..4)
            .map(|worker| {
                let index = &index;
                let tags = &tags;
                let sequential = &sequential;
                let opt = &opt;
                scope.spawn(move || {
                    for (i, tag) in tags.iter().enumerate().skip(worker % 2) {
                        assert_eq!(&flatten(&index.map_tag(tag, opt, 0.01).unwrap()), &sequential[i]);
                        let peptide = match &tag[0] {
                            TagElement::Sequence(s) => s.as_str(),
                            TagElement::MassGap(_) => unreachable!(),
                        };
                        assert!(!index.map_peptide(peptide, opt).unwrap().is_empty());
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
    });
}

#[test]
fn closed_index_rejects_queries() {
    let db = random_db(1, 2, b"ACDE");
    let mut index = build(&db, &IndexConfig::default());
    index.close();
    assert!(matches!(
        index.map_peptide("ACD", &MatchingOptions::default()),
        Err(protein_fm::IndexError::Closed)
    ));
}
