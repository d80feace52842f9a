use dexgen_core::{PokemonResource, Stats};

pub fn map_stats(pokemon: &PokemonResource) -> Stats {
    let base = |name: &str| {
        pokemon
            .stats
            .iter()
            .rev()
            .find(|s| s.stat.name == name)
            .and_then(|s| s.base_stat)
    };

    Stats {
        hp: base("hp"),
        atk: base("attack"),
        def: base("defense"),
        sp_atk: base("special-attack"),
        sp_def: base("special-defense"),
        speed: base("speed"),
    }
}
