// URL builders for the Riot endpoints the cache uses. The key travels in
// the X-Riot-Token header, never in the query string.

pub fn regional_routing(platform: &str) -> &'static str {
    match platform {
        "na1" | "br1" | "la1" | "la2" => "americas",
        "euw1" | "eun1" | "tr1" | "ru" | "me1" => "europe",
        "kr" | "jp1" => "asia",
        "oc1" | "ph2" | "sg2" | "th2" | "tw2" | "vn2" => "sea",
        _ => "americas", // default
    }
}

pub fn match_ids_url(regional: &str, puuid: &str, start: usize, count: usize) -> String {
    format!(
        "https://{}.api.riotgames.com/lol/match/v5/matches/by-puuid/{}/ids?start={}&count={}",
        regional, puuid, start, count
    )
}

pub fn match_url(regional: &str, match_id: &str) -> String {
    format!(
        "https://{}.api.riotgames.com/lol/match/v5/matches/{}",
        regional, match_id
    )
}

pub fn league_entries_url(platform: &str, puuid: &str) -> String {
    format!(
        "https://{}.api.riotgames.com/lol/league/v4/entries/by-puuid/{}",
        platform, puuid
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_regional_routing() {
        assert_eq!(regional_routing("na1"), "americas");
        assert_eq!(regional_routing("euw1"), "europe");
        assert_eq!(regional_routing("kr"), "asia");
        assert_eq!(regional_routing("oc1"), "sea");
        assert_eq!(regional_routing("unknown"), "americas");
    }

    #[test]
    fn test_urls() {
        assert_eq!(
            match_ids_url("americas", "abc", 100, 100),
            "https://americas.api.riotgames.com/lol/match/v5/matches/by-puuid/abc/ids?start=100&count=100"
        );
        assert_eq!(
            match_url("europe", "EUW1_42"),
            "https://europe.api.riotgames.com/lol/match/v5/matches/EUW1_42"
        );
        assert_eq!(
            league_entries_url("na1", "abc"),
            "https://na1.api.riotgames.com/lol/league/v4/entries/by-puuid/abc"
        );
    }
}
