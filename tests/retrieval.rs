use lexweight::bm25::Bm25Weight;
use lexweight::index::MemoryIndex;
use lexweight::postlist::PostList;
use lexweight::stats::{DocumentSource, ScoringEnv};
use lexweight::{DocId, Error, Registry, Scheme, Weight};
use std::collections::BTreeMap;

fn toks(s: &str) -> Vec<String> {
    s.split_whitespace().map(String::from).collect()
}

/// Twenty documents over an eight-word vocabulary with skewed term frequencies.
fn corpus() -> MemoryIndex {
    let mut index = MemoryIndex::new();
    let mut state: u64 = 0x2545_f491_4f6c_dd1d;
    for doc in 1..=20u32 {
        state = state.wrapping_mul(6_364_136_223_846_793_005).wrapping_add(1_442_695_040_888_963_407);
        let len = 1 + (state >> 33) % 12;
        let mut terms = Vec::new();
        for _ in 0..len {
            state = state.wrapping_mul(6_364_136_223_846_793_005).wrapping_add(1_442_695_040_888_963_407);
            // Squaring a uniform pick favours low word numbers.
            let u = ((state >> 33) % 1000) as f64 / 1000.0;
            terms.push(format!("w{}", (u * u * 8.0) as u32));
        }
        index.add_document(doc, &terms);
    }
    index
}

/// Score every document the slow way and rank it exactly like the matcher does.
fn exhaustive(
    index: &MemoryIndex,
    query: &[String],
    scheme: &dyn Scheme,
    k: usize,
    rset: &[DocId],
) -> Vec<(DocId, f64)> {
    let mut wqfs: BTreeMap<&str, u32> = BTreeMap::new();
    for term in query {
        *wqfs.entry(term.as_str()).or_insert(0) += 1;
    }
    let distinct: Vec<&str> = wqfs.keys().copied().collect();
    let stats = index.collection_stats(&distinct, rset);
    let env = ScoringEnv::new(&stats, index, query.len() as u32);
    let weights: Vec<(&str, Weight)> = wqfs
        .iter()
        .map(|(&term, &wqf)| {
            let pl = index.postlist(term);
            let w = Weight::initialize_for_term(
                scheme.clone_box(),
                &env,
                term,
                wqf,
                1.0,
                Some(&pl as &dyn PostList),
            );
            (term, w)
        })
        .collect();
    let extra = Weight::initialize_for_extra(scheme.clone_box(), &env);

    let mut ranked = Vec::new();
    for did in index.document_ids() {
        let len = index.doclength(did);
        let uniq = index.unique_terms(did);
        let wdm = index.wdf_doc_max(did);
        let mut score = 0.0;
        let mut matched = false;
        for (term, w) in &weights {
            let wdf = index.term_frequency(did, term);
            if wdf > 0 {
                matched = true;
                score += w.partial_score(wdf, len, uniq, wdm);
            }
        }
        if matched {
            ranked.push((did, score + extra.extra_score(len, uniq, wdm)));
        }
    }
    ranked.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    ranked.truncate(k);
    ranked
}

fn assert_same_ranking(got: &[(DocId, f64)], want: &[(DocId, f64)], label: &str) {
    assert_eq!(got.len(), want.len(), "{label}: {got:?} vs {want:?}");
    for (g, w) in got.iter().zip(want) {
        assert_eq!(g.0, w.0, "{label}: {got:?} vs {want:?}");
        assert!((g.1 - w.1).abs() <= 1e-9 * w.1.abs().max(1.0), "{label}: {g:?} vs {w:?}");
    }
}

const QUERIES: &[&str] = &["w0 w1", "w2 w2 w5", "w7", "w1 w3 w4 w6", "w0 w0 w0 w3 w7"];

#[test]
fn pruned_search_matches_exhaustive_ranking() {
    let index = corpus();
    let registry = Registry::default();
    let mut configs: Vec<String> = registry.names().map(String::from).collect();
    configs.extend(
        ["bm25 2 0 1 1 0", "tfidf Ltn", "tfidf Pfn", "lmjm 0.4", "lmdirichlet 50 0.2"]
            .map(String::from),
    );
    for config in &configs {
        let scheme = registry.create(config).unwrap();
        for query in QUERIES {
            let query = toks(query);
            for k in [1, 3, 20] {
                let got = index.search(&query, scheme.as_ref(), k).unwrap();
                let want = exhaustive(&index, &query, scheme.as_ref(), k, &[]);
                assert_same_ranking(&got, &want, &format!("{config} {query:?} k={k}"));
            }
        }
    }
}

#[test]
fn equal_scores_rank_by_doc_id() {
    let mut index = MemoryIndex::new();
    for id in [9, 4, 6, 1] {
        index.add_document(id, &toks("same words here"));
    }
    index.add_document(5, &toks("other words"));
    let hits = index.search(&toks("same"), &Bm25Weight::default(), 3).unwrap();
    let ids: Vec<DocId> = hits.iter().map(|&(d, _)| d).collect();
    assert_eq!(ids, vec![1, 4, 6]);
    assert!(hits.windows(2).all(|w| w[0].1 == w[1].1));
}

#[test]
fn relevance_feedback_boosts_terms_in_judged_documents() {
    let mut index = MemoryIndex::new();
    index.add_document(1, &toks("x y"));
    index.add_document(2, &toks("x z"));
    index.add_document(3, &toks("y z"));
    index.add_document(4, &toks("w"));
    index.add_document(5, &toks("w w"));
    let query = toks("x y");
    let scheme = Bm25Weight::default();

    let score_of = |hits: &[(DocId, f64)], did: DocId| {
        hits.iter().find(|h| h.0 == did).map(|h| h.1).unwrap()
    };
    let plain = index.search(&query, &scheme, 10).unwrap();
    let judged = index.search_with_rset(&query, &scheme, 10, &[3]).unwrap();
    assert!(score_of(&judged, 3) > score_of(&plain, 3));
    // Document 2 only has "x", which the judged document lacks.
    assert!(score_of(&judged, 2) < score_of(&plain, 2));

    let want = exhaustive(&index, &query, &scheme, 10, &[3]);
    assert_same_ranking(&judged, &want, "rset");
}

#[test]
fn factory_strings_drive_search() {
    let index = corpus();
    let registry = Registry::default();
    let query = toks("w1 w3");
    let from_string = registry.create("bm25 1 0 1 0.5 0.5").unwrap();
    let a = index.search(&query, from_string.as_ref(), 5).unwrap();
    let b = index.search(&query, &Bm25Weight::default(), 5).unwrap();
    assert_eq!(a, b);

    let coord = registry.create("coord").unwrap();
    let hits = index.search(&query, coord.as_ref(), 20).unwrap();
    assert!(hits.iter().all(|&(_, s)| s == 1.0 || s == 2.0));
    let both = hits.iter().filter(|&&(_, s)| s == 2.0).count();
    let expected = index
        .document_ids()
        .filter(|&d| index.term_frequency(d, "w1") > 0 && index.term_frequency(d, "w3") > 0)
        .count();
    assert_eq!(both, expected);
}

#[test]
fn updates_change_results() {
    let mut index = MemoryIndex::new();
    index.add_document(1, &toks("alpha beta"));
    index.add_document(2, &toks("gamma"));
    let q = toks("alpha");
    assert_eq!(index.search(&q, &Bm25Weight::default(), 5).unwrap().len(), 1);

    index.add_document(1, &toks("gamma gamma"));
    assert!(index.search(&q, &Bm25Weight::default(), 5).unwrap().is_empty());
    index.add_document(2, &toks("alpha"));
    let hits = index.search(&q, &Bm25Weight::default(), 5).unwrap();
    assert_eq!(hits.iter().map(|h| h.0).collect::<Vec<_>>(), vec![2]);
}

#[test]
fn degenerate_inputs() {
    let empty = MemoryIndex::new();
    let scheme = Bm25Weight::default();
    assert_eq!(
        empty.search(&toks("a"), &scheme, 3).unwrap_err(),
        Error::EmptyIndex
    );

    let index = corpus();
    assert_eq!(index.search(&[], &scheme, 3).unwrap_err(), Error::EmptyQuery);
    assert!(index.search(&toks("w0"), &scheme, 0).unwrap().is_empty());
    assert!(index.search(&toks("absent"), &scheme, 3).unwrap().is_empty());
    let hits = index.search(&toks("absent w0"), &scheme, 50).unwrap();
    assert_eq!(hits.len() as u32, index.doc_frequency("w0"));
}
