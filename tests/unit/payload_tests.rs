/*!
 * Tests for sentence grouping and payload building
 */

use std::collections::HashSet;

use subvocab::enhancement::payload::{
    CandidateRow, GROUP_SIZE, PayloadBuilder, group_by_sentence, interleave, partition_groups,
};

use crate::common;

/// Words of one sentence are spread over groups
#[test]
fn test_build_withTwoSentences_shouldInterleaveIntoGroupsOfThree() {
    let payload = PayloadBuilder::build(&common::abcde_rows());

    let groups: Vec<(i64, Vec<i64>)> = payload
        .request
        .groups
        .iter()
        .map(|g| (g.gid, g.wids.clone()))
        .collect();
    assert_eq!(groups, vec![(1, vec![1, 4, 2]), (2, vec![5, 3])]);
}

#[test]
fn test_build_shouldKeepSentenceOrderAndWordsPerSentence() {
    let payload = PayloadBuilder::build(&common::abcde_rows());

    assert_eq!(payload.sentence_count(), 2);
    assert_eq!(payload.word_count(), 5);
    assert_eq!(payload.request.data[0].id, 10);
    assert_eq!(payload.request.data[0].text, "S1");
    let bases: Vec<&str> = payload.request.data[1]
        .words
        .iter()
        .map(|w| w.base.as_str())
        .collect();
    assert_eq!(bases, vec!["D", "E"]);
}

/// Every word lands in exactly one group
#[test]
fn test_build_withManySentences_shouldCoverEveryWordOnce() {
    let rows = common::generated_rows(7, 4);
    let payload = PayloadBuilder::build(&rows);

    let grouped: Vec<i64> = payload
        .request
        .groups
        .iter()
        .flat_map(|g| g.wids.iter().copied())
        .collect();
    let unique: HashSet<i64> = grouped.iter().copied().collect();

    assert_eq!(grouped.len(), rows.len());
    assert_eq!(unique.len(), rows.len());
    assert!(payload.request.groups.iter().all(|g| g.wids.len() <= GROUP_SIZE));
}

#[test]
fn test_build_shouldResolveSentenceRefsToStoreIds() {
    let payload = PayloadBuilder::build(&common::abcde_rows());

    assert_eq!(payload.resolve_sentence(20), Some(20));
    assert_eq!(payload.resolve_sentence(99), None);
}

#[test]
fn test_build_withNoRows_shouldProduceEmptyRequest() {
    let payload = PayloadBuilder::build(&[]);
    assert!(payload.request.is_empty());
    assert!(payload.request.groups.is_empty());
}

/// A word listed twice is only sent once
#[test]
fn test_groupBySentence_withDuplicateWord_shouldKeepFirst() {
    let mut rows = common::abcde_rows();
    rows.push(CandidateRow::new(2, "B", 10, "S1"));

    let tasks = group_by_sentence(&rows);
    assert_eq!(tasks.len(), 2);
    assert_eq!(tasks[0].words.len(), 3);
}

#[test]
fn test_interleave_withUnevenBuckets_shouldRoundRobin() {
    let merged = interleave(&[vec![1, 2, 3, 4], vec![10], vec![20, 21]]);
    assert_eq!(merged, vec![1, 10, 20, 2, 21, 3, 4]);
}

#[test]
fn test_partitionGroups_shouldNumberFromOne() {
    let groups = partition_groups(&[7, 8, 9, 10]);
    assert_eq!(groups.len(), 2);
    assert_eq!(groups[0].gid, 1);
    assert_eq!(groups[1].gid, 2);
    assert_eq!(groups[1].wids, vec![10]);
}
