use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

use super::corpus::Corpus;
use super::similarity::SimilarityMatrix;
use super::vocabulary::Vocabulary;

const SAMPLE_TITLES: usize = 5;
const TOP_TAGS: usize = 8;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TagCount {
    pub tag: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct YearCount {
    pub year: i32,
    pub count: usize,
}

/// Summary of the loaded corpus.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CorpusStats {
    pub total_movies: usize,
    pub unique_tags: usize,
    pub sample_titles: String,
    pub top_tags: Vec<TagCount>,
    pub years: Vec<YearCount>,
    pub vocabulary_size: usize,
    pub zero_vector_movies: usize,
}

impl CorpusStats {
    pub fn collect(corpus: &Corpus, vocabulary: &Vocabulary, matrix: &SimilarityMatrix) -> Self {
        let mut slots: HashMap<&str, usize> = HashMap::new();
        let mut tags: Vec<TagCount> = Vec::new();
        for tag in corpus.tags().flat_map(str::split_whitespace) {
            match slots.get(tag) {
                Some(&slot) => tags[slot].count += 1,
                None => {
                    slots.insert(tag, tags.len());
                    tags.push(TagCount {
                        tag: tag.to_string(),
                        count: 1,
                    });
                }
            }
        }
        let unique_tags = tags.len();
        tags.sort_by(|a, b| b.count.cmp(&a.count));
        tags.truncate(TOP_TAGS);

        let mut years: BTreeMap<i32, usize> = BTreeMap::new();
        for year in corpus.movies().iter().filter_map(|m| m.year) {
            *years.entry(year).or_insert(0) += 1;
        }

        let sample_titles = corpus
            .movies()
            .iter()
            .take(SAMPLE_TITLES)
            .map(|m| m.title.as_str())
            .collect::<Vec<_>>()
            .join(", ");

        Self {
            total_movies: corpus.len(),
            unique_tags,
            sample_titles,
            top_tags: tags,
            years: years
                .into_iter()
                .map(|(year, count)| YearCount { year, count })
                .collect(),
            vocabulary_size: vocabulary.len(),
            zero_vector_movies: matrix.zero_rows(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::corpus::Movie;
    use crate::engine::engine::Engine;
    use crate::engine::stopwords::StopWords;

    #[test]
    fn test_collect() {
        let mut movies = vec![
            Movie::new(1, "Avatar", "space alien war"),
            Movie::new(2, "The Avengers", "alien invasion war alien"),
            Movie::new(3, "Titanic", "romance drama"),
            Movie::new(4, "Up", "the"),
        ];
        movies[0].year = Some(2009);
        movies[1].year = Some(2012);
        movies[2].year = Some(1997);
        movies[3].year = Some(2009);

        let engine = Engine::build(Corpus::new(movies).unwrap(), &StopWords::english(), 5000)
            .unwrap();
        let stats = engine.stats();

        assert_eq!(stats.total_movies, 4);
        assert_eq!(stats.unique_tags, 7);
        assert_eq!(stats.sample_titles, "Avatar, The Avengers, Titanic, Up");
        assert_eq!(
            stats.top_tags[0],
            TagCount {
                tag: "alien".to_string(),
                count: 3
            }
        );
        assert_eq!(stats.top_tags[1].tag, "war");
        assert_eq!(stats.top_tags[2].tag, "space");
        assert_eq!(
            stats.years,
            vec![
                YearCount { year: 1997, count: 1 },
                YearCount { year: 2009, count: 2 },
                YearCount { year: 2012, count: 1 },
            ]
        );
        assert_eq!(stats.vocabulary_size, 6);
        assert_eq!(stats.zero_vector_movies, 1);
    }
}
