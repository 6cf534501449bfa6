//! Data-driven registries broadcast during configuration.
//!
//! Entry ordering defines numeric IDs starting from 0, so every list below is
//! protocol-visible and fixed. With the known-packs optimization the vanilla
//! entries carry no NBT (the client fills them from its local core pack);
//! custom entries added by embedders keep their inline payload.

use azalea_protocol::packets::config::{ClientboundConfigPacket, ClientboundRegistryData};
use azalea_protocol::packets::Packet;
use azalea_protocol::common::tags::Tags;
use azalea_protocol::simdnbt::owned::NbtCompound;
use azalea_registry::identifier::Identifier;

/// Every registry the lifecycle core knows about.
///
/// The discriminant indexes into [`Registries`]; the declaration order here
/// is not protocol-visible (the wire orders are [`DATA_REGISTRIES`] and
/// [`TAG_REGISTRIES`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(usize)]
pub enum RegistryKind {
    ChatType = 0,
    DimensionType,
    Biome,
    Dialog,
    DamageType,
    TrimMaterial,
    TrimPattern,
    BannerPattern,
    Enchantment,
    PaintingVariant,
    JukeboxSong,
    Instrument,
    WolfVariant,
    WolfSoundVariant,
    CatVariant,
    ChickenVariant,
    CowVariant,
    FrogVariant,
    PigVariant,
    Blocks,
    EntityType,
    Fluid,
    GameEvent,
    Material,
}

impl RegistryKind {
    pub const COUNT: usize = 24;

    pub const ALL: [RegistryKind; Self::COUNT] = [
        RegistryKind::ChatType,
        RegistryKind::DimensionType,
        RegistryKind::Biome,
        RegistryKind::Dialog,
        RegistryKind::DamageType,
        RegistryKind::TrimMaterial,
        RegistryKind::TrimPattern,
        RegistryKind::BannerPattern,
        RegistryKind::Enchantment,
        RegistryKind::PaintingVariant,
        RegistryKind::JukeboxSong,
        RegistryKind::Instrument,
        RegistryKind::WolfVariant,
        RegistryKind::WolfSoundVariant,
        RegistryKind::CatVariant,
        RegistryKind::ChickenVariant,
        RegistryKind::CowVariant,
        RegistryKind::FrogVariant,
        RegistryKind::PigVariant,
        RegistryKind::Blocks,
        RegistryKind::EntityType,
        RegistryKind::Fluid,
        RegistryKind::GameEvent,
        RegistryKind::Material,
    ];

    /// Wire identifier of the registry.
    pub fn id(self) -> &'static str {
        match self {
            RegistryKind::ChatType => "minecraft:chat_type",
            RegistryKind::DimensionType => "minecraft:dimension_type",
            RegistryKind::Biome => "minecraft:worldgen/biome",
            RegistryKind::Dialog => "minecraft:dialog",
            RegistryKind::DamageType => "minecraft:damage_type",
            RegistryKind::TrimMaterial => "minecraft:trim_material",
            RegistryKind::TrimPattern => "minecraft:trim_pattern",
            RegistryKind::BannerPattern => "minecraft:banner_pattern",
            RegistryKind::Enchantment => "minecraft:enchantment",
            RegistryKind::PaintingVariant => "minecraft:painting_variant",
            RegistryKind::JukeboxSong => "minecraft:jukebox_song",
            RegistryKind::Instrument => "minecraft:instrument",
            RegistryKind::WolfVariant => "minecraft:wolf_variant",
            RegistryKind::WolfSoundVariant => "minecraft:wolf_sound_variant",
            RegistryKind::CatVariant => "minecraft:cat_variant",
            RegistryKind::ChickenVariant => "minecraft:chicken_variant",
            RegistryKind::CowVariant => "minecraft:cow_variant",
            RegistryKind::FrogVariant => "minecraft:frog_variant",
            RegistryKind::PigVariant => "minecraft:pig_variant",
            RegistryKind::Blocks => "minecraft:block",
            RegistryKind::EntityType => "minecraft:entity_type",
            RegistryKind::Fluid => "minecraft:fluid",
            RegistryKind::GameEvent => "minecraft:game_event",
            RegistryKind::Material => "minecraft:item",
        }
    }
}

/// Registries whose data packets are sent during configuration, in the order
/// the client expects them.
pub const DATA_REGISTRIES: [RegistryKind; 19] = [
    RegistryKind::ChatType,
    RegistryKind::DimensionType,
    RegistryKind::Biome,
    RegistryKind::Dialog,
    RegistryKind::DamageType,
    RegistryKind::TrimMaterial,
    RegistryKind::TrimPattern,
    RegistryKind::BannerPattern,
    RegistryKind::Enchantment,
    RegistryKind::PaintingVariant,
    RegistryKind::JukeboxSong,
    RegistryKind::Instrument,
    RegistryKind::WolfVariant,
    RegistryKind::WolfSoundVariant,
    RegistryKind::CatVariant,
    RegistryKind::ChickenVariant,
    RegistryKind::CowVariant,
    RegistryKind::FrogVariant,
    RegistryKind::PigVariant,
];

/// Registries whose tags the vanilla client consumes, in the order they are
/// concatenated into the tag broadcast.
pub const TAG_REGISTRIES: [RegistryKind; 13] = [
    RegistryKind::BannerPattern,
    RegistryKind::Biome,
    RegistryKind::Blocks,
    RegistryKind::CatVariant,
    RegistryKind::DamageType,
    RegistryKind::Dialog,
    RegistryKind::Enchantment,
    RegistryKind::EntityType,
    RegistryKind::Fluid,
    RegistryKind::GameEvent,
    RegistryKind::Instrument,
    RegistryKind::Material,
    RegistryKind::PaintingVariant,
];

/// One named entry in a registry. `data` is inline NBT for custom additions;
/// vanilla entries leave it `None` and rely on the client's core pack.
#[derive(Debug, Clone)]
pub struct RegistryEntry {
    pub name: String,
    pub data: Option<NbtCompound>,
}

/// The contents of a single registry: its entries (order = numeric IDs) and
/// its tags (tag name to element IDs).
#[derive(Debug, Clone)]
pub struct RegistryHandle {
    kind: RegistryKind,
    pub entries: Vec<RegistryEntry>,
    pub tags: Vec<(String, Vec<i32>)>,
}

impl RegistryHandle {
    pub fn new(kind: RegistryKind) -> Self {
        Self {
            kind,
            entries: Vec::new(),
            tags: Vec::new(),
        }
    }

    pub fn kind(&self) -> RegistryKind {
        self.kind
    }

    /// The registry-data packet for this registry. `exclude_vanilla` drops
    /// per-entry NBT for clients that declared the core known pack.
    pub fn registry_data_packet(&self, exclude_vanilla: bool) -> ClientboundConfigPacket {
        ClientboundRegistryData {
            registry_id: Identifier::new(self.kind.id()),
            entries: self
                .entries
                .iter()
                .map(|entry| {
                    let data = if exclude_vanilla {
                        None
                    } else {
                        entry.data.clone()
                    };
                    (Identifier::new(&entry.name), data)
                })
                .collect(),
        }
        .into_variant()
    }

    /// This registry's slice of the tag broadcast.
    pub fn tag_registry(&self) -> (Identifier, Vec<Tags>) {
        (
            Identifier::new(self.kind.id()),
            self.tags
                .iter()
                .map(|(name, elements)| Tags {
                    name: Identifier::new(name),
                    elements: elements.clone(),
                })
                .collect(),
        )
    }
}

/// All registries of the running server, indexed by [`RegistryKind`].
pub struct Registries {
    handles: Vec<RegistryHandle>,
}

impl Registries {
    /// Every registry present but empty. Useful for embedders that provide
    /// their own data end to end.
    pub fn empty() -> Self {
        Self {
            handles: RegistryKind::ALL.iter().map(|&k| RegistryHandle::new(k)).collect(),
        }
    }

    /// The vanilla data set: entry names matching the client's core pack.
    pub fn vanilla() -> Self {
        let mut registries = Self::empty();
        for (kind, names) in vanilla_entries() {
            registries.handle_mut(kind).entries = names
                .iter()
                .map(|&name| RegistryEntry {
                    name: name.to_string(),
                    data: None,
                })
                .collect();
        }
        for (kind, tags) in vanilla_tags() {
            registries.handle_mut(kind).tags = tags
                .iter()
                .map(|(name, elements)| (name.to_string(), elements.clone()))
                .collect();
        }
        registries
    }

    pub fn registry(&self, kind: RegistryKind) -> &RegistryHandle {
        &self.handles[kind as usize]
    }

    pub fn handle_mut(&mut self, kind: RegistryKind) -> &mut RegistryHandle {
        &mut self.handles[kind as usize]
    }
}

/// Entry identifiers per registry. Ordering must match the vanilla server so
/// the known-packs optimization resolves the same numeric IDs client-side.
fn vanilla_entries() -> Vec<(RegistryKind, &'static [&'static str])> {
    vec![
        (RegistryKind::ChatType, &[
            "minecraft:chat", "minecraft:emote_command", "minecraft:msg_command_incoming",
            "minecraft:msg_command_outgoing", "minecraft:say_command",
            "minecraft:team_msg_command_incoming", "minecraft:team_msg_command_outgoing",
        ]),
        (RegistryKind::DimensionType, &[
            "minecraft:overworld", "minecraft:overworld_caves",
            "minecraft:the_nether", "minecraft:the_end",
        ]),
        (RegistryKind::Biome, &[
            "minecraft:badlands", "minecraft:bamboo_jungle", "minecraft:basalt_deltas",
            "minecraft:beach", "minecraft:birch_forest", "minecraft:cherry_grove",
            "minecraft:cold_ocean", "minecraft:crimson_forest", "minecraft:dark_forest",
            "minecraft:deep_cold_ocean", "minecraft:deep_dark", "minecraft:deep_frozen_ocean",
            "minecraft:deep_lukewarm_ocean", "minecraft:deep_ocean", "minecraft:desert",
            "minecraft:dripstone_caves", "minecraft:end_barrens", "minecraft:end_highlands",
            "minecraft:end_midlands", "minecraft:eroded_badlands", "minecraft:flower_forest",
            "minecraft:forest", "minecraft:frozen_ocean", "minecraft:frozen_peaks",
            "minecraft:frozen_river", "minecraft:grove", "minecraft:ice_spikes",
            "minecraft:jagged_peaks", "minecraft:jungle", "minecraft:lukewarm_ocean",
            "minecraft:lush_caves", "minecraft:mangrove_swamp", "minecraft:meadow",
            "minecraft:mushroom_fields", "minecraft:nether_wastes", "minecraft:ocean",
            "minecraft:old_growth_birch_forest", "minecraft:old_growth_pine_taiga",
            "minecraft:old_growth_spruce_taiga", "minecraft:pale_garden", "minecraft:plains",
            "minecraft:river", "minecraft:savanna", "minecraft:savanna_plateau",
            "minecraft:small_end_islands", "minecraft:snowy_beach", "minecraft:snowy_plains",
            "minecraft:snowy_slopes", "minecraft:snowy_taiga", "minecraft:soul_sand_valley",
            "minecraft:sparse_jungle", "minecraft:stony_peaks", "minecraft:stony_shore",
            "minecraft:sunflower_plains", "minecraft:swamp", "minecraft:taiga",
            "minecraft:the_end", "minecraft:the_void", "minecraft:warm_ocean",
            "minecraft:warped_forest", "minecraft:windswept_forest",
            "minecraft:windswept_gravelly_hills", "minecraft:windswept_hills",
            "minecraft:windswept_savanna", "minecraft:wooded_badlands",
        ]),
        (RegistryKind::Dialog, &[
            "minecraft:custom_options", "minecraft:quick_actions", "minecraft:server_links",
        ]),
        (RegistryKind::DamageType, &[
            "minecraft:arrow", "minecraft:bad_respawn_point", "minecraft:cactus",
            "minecraft:campfire", "minecraft:cramming", "minecraft:dragon_breath",
            "minecraft:drown", "minecraft:dry_out", "minecraft:ender_pearl",
            "minecraft:explosion", "minecraft:fall", "minecraft:falling_anvil",
            "minecraft:falling_block", "minecraft:falling_stalactite", "minecraft:fireball",
            "minecraft:fireworks", "minecraft:fly_into_wall", "minecraft:freeze",
            "minecraft:generic", "minecraft:generic_kill", "minecraft:hot_floor",
            "minecraft:in_fire", "minecraft:in_wall", "minecraft:indirect_magic",
            "minecraft:lava", "minecraft:lightning_bolt", "minecraft:mace_smash",
            "minecraft:magic", "minecraft:mob_attack", "minecraft:mob_attack_no_aggro",
            "minecraft:mob_projectile", "minecraft:on_fire", "minecraft:out_of_world",
            "minecraft:outside_border", "minecraft:player_attack",
            "minecraft:player_explosion", "minecraft:sonic_boom", "minecraft:spear",
            "minecraft:spit", "minecraft:stalagmite", "minecraft:starve", "minecraft:sting",
            "minecraft:sweet_berry_bush", "minecraft:thorns", "minecraft:thrown",
            "minecraft:trident", "minecraft:unattributed_fireball", "minecraft:wind_charge",
            "minecraft:wither", "minecraft:wither_skull",
        ]),
        (RegistryKind::TrimMaterial, &[
            "minecraft:amethyst", "minecraft:copper", "minecraft:diamond",
            "minecraft:emerald", "minecraft:gold", "minecraft:iron", "minecraft:lapis",
            "minecraft:netherite", "minecraft:quartz", "minecraft:redstone",
            "minecraft:resin",
        ]),
        (RegistryKind::TrimPattern, &[
            "minecraft:bolt", "minecraft:coast", "minecraft:dune", "minecraft:eye",
            "minecraft:flow", "minecraft:host", "minecraft:raiser", "minecraft:rib",
            "minecraft:sentry", "minecraft:shaper", "minecraft:silence", "minecraft:snout",
            "minecraft:spire", "minecraft:tide", "minecraft:vex", "minecraft:ward",
            "minecraft:wayfinder", "minecraft:wild",
        ]),
        (RegistryKind::BannerPattern, &[
            "minecraft:base", "minecraft:border", "minecraft:bricks", "minecraft:circle",
            "minecraft:creeper", "minecraft:cross", "minecraft:curly_border",
            "minecraft:diagonal_left", "minecraft:diagonal_right",
            "minecraft:diagonal_up_left", "minecraft:diagonal_up_right", "minecraft:flow",
            "minecraft:flower", "minecraft:globe", "minecraft:gradient",
            "minecraft:gradient_up", "minecraft:guster", "minecraft:half_horizontal",
            "minecraft:half_horizontal_bottom", "minecraft:half_vertical",
            "minecraft:half_vertical_right", "minecraft:mojang", "minecraft:piglin",
            "minecraft:rhombus", "minecraft:skull", "minecraft:small_stripes",
            "minecraft:square_bottom_left", "minecraft:square_bottom_right",
            "minecraft:square_top_left", "minecraft:square_top_right",
            "minecraft:straight_cross", "minecraft:stripe_bottom", "minecraft:stripe_center",
            "minecraft:stripe_downleft", "minecraft:stripe_downright",
            "minecraft:stripe_left", "minecraft:stripe_middle", "minecraft:stripe_right",
            "minecraft:stripe_top", "minecraft:triangle_bottom", "minecraft:triangle_top",
            "minecraft:triangles_bottom", "minecraft:triangles_top",
        ]),
        (RegistryKind::Enchantment, &[
            "minecraft:aqua_affinity", "minecraft:bane_of_arthropods",
            "minecraft:binding_curse", "minecraft:blast_protection", "minecraft:breach",
            "minecraft:channeling", "minecraft:density", "minecraft:depth_strider",
            "minecraft:efficiency", "minecraft:feather_falling", "minecraft:fire_aspect",
            "minecraft:fire_protection", "minecraft:flame", "minecraft:fortune",
            "minecraft:frost_walker", "minecraft:impaling", "minecraft:infinity",
            "minecraft:knockback", "minecraft:looting", "minecraft:loyalty",
            "minecraft:luck_of_the_sea", "minecraft:lure", "minecraft:mending",
            "minecraft:multishot", "minecraft:piercing", "minecraft:power",
            "minecraft:projectile_protection", "minecraft:protection", "minecraft:punch",
            "minecraft:quick_charge", "minecraft:respiration", "minecraft:riptide",
            "minecraft:sharpness", "minecraft:silk_touch", "minecraft:smite",
            "minecraft:soul_speed", "minecraft:sweeping_edge", "minecraft:swift_sneak",
            "minecraft:thorns", "minecraft:unbreaking", "minecraft:vanishing_curse",
            "minecraft:wind_burst",
        ]),
        (RegistryKind::PaintingVariant, &[
            "minecraft:alban", "minecraft:aztec", "minecraft:aztec2", "minecraft:backyard",
            "minecraft:baroque", "minecraft:bomb", "minecraft:bouquet",
            "minecraft:burning_skull", "minecraft:bust", "minecraft:cavebird",
            "minecraft:changing", "minecraft:cotan", "minecraft:courbet",
            "minecraft:creebet", "minecraft:dennis", "minecraft:donkey_kong",
            "minecraft:earth", "minecraft:endboss", "minecraft:fern", "minecraft:fighters",
            "minecraft:finding", "minecraft:fire", "minecraft:graham", "minecraft:humble",
            "minecraft:kebab", "minecraft:lowmist", "minecraft:match",
            "minecraft:meditative", "minecraft:orb", "minecraft:owlemons",
            "minecraft:passage", "minecraft:pigscene", "minecraft:plant",
            "minecraft:pointer", "minecraft:pond", "minecraft:pool",
            "minecraft:prairie_ride", "minecraft:sea", "minecraft:skeleton",
            "minecraft:skull_and_roses", "minecraft:stage", "minecraft:sunflowers",
            "minecraft:sunset", "minecraft:tides", "minecraft:unpacked", "minecraft:void",
            "minecraft:wanderer", "minecraft:wasteland", "minecraft:water",
            "minecraft:wind", "minecraft:wither",
        ]),
        (RegistryKind::JukeboxSong, &[
            "minecraft:5", "minecraft:11", "minecraft:13", "minecraft:blocks",
            "minecraft:cat", "minecraft:chirp", "minecraft:creator",
            "minecraft:creator_music_box", "minecraft:far", "minecraft:lava_chicken",
            "minecraft:mall", "minecraft:mellohi", "minecraft:otherside",
            "minecraft:pigstep", "minecraft:precipice", "minecraft:relic",
            "minecraft:stal", "minecraft:strad", "minecraft:tears", "minecraft:wait",
            "minecraft:ward",
        ]),
        (RegistryKind::Instrument, &[
            "minecraft:admire_goat_horn", "minecraft:call_goat_horn",
            "minecraft:dream_goat_horn", "minecraft:feel_goat_horn",
            "minecraft:ponder_goat_horn", "minecraft:seek_goat_horn",
            "minecraft:sing_goat_horn", "minecraft:yearn_goat_horn",
        ]),
        (RegistryKind::WolfVariant, &[
            "minecraft:ashen", "minecraft:black", "minecraft:chestnut", "minecraft:pale",
            "minecraft:rusty", "minecraft:snowy", "minecraft:spotted", "minecraft:striped",
            "minecraft:woods",
        ]),
        (RegistryKind::WolfSoundVariant, &[
            "minecraft:angry", "minecraft:big", "minecraft:classic", "minecraft:cute",
            "minecraft:grumpy", "minecraft:puglin", "minecraft:sad",
        ]),
        (RegistryKind::CatVariant, &[
            "minecraft:all_black", "minecraft:black", "minecraft:british_shorthair",
            "minecraft:calico", "minecraft:jellie", "minecraft:persian",
            "minecraft:ragdoll", "minecraft:red", "minecraft:siamese", "minecraft:tabby",
            "minecraft:white",
        ]),
        (RegistryKind::ChickenVariant, &[
            "minecraft:cold", "minecraft:temperate", "minecraft:warm",
        ]),
        (RegistryKind::CowVariant, &[
            "minecraft:cold", "minecraft:temperate", "minecraft:warm",
        ]),
        (RegistryKind::FrogVariant, &[
            "minecraft:cold", "minecraft:temperate", "minecraft:warm",
        ]),
        (RegistryKind::PigVariant, &[
            "minecraft:cold", "minecraft:temperate", "minecraft:warm",
        ]),
    ]
}

/// Tags consumed by the vanilla client. Element values are numeric IDs in
/// the owning registry (entry positions for data registries, static protocol
/// IDs for the built-in ones).
fn vanilla_tags() -> Vec<(RegistryKind, Vec<(&'static str, Vec<i32>)>)> {
    vec![
        (RegistryKind::Biome, vec![
            ("minecraft:is_badlands", vec![0, 19, 63]),
            ("minecraft:is_ocean", vec![6, 13, 22, 29, 35, 58]),
            ("minecraft:is_nether", vec![2, 7, 34, 49, 59]),
            ("minecraft:is_end", vec![16, 17, 18, 44, 56]),
        ]),
        (RegistryKind::Blocks, vec![
            ("minecraft:climbable", vec![1, 2]),
            ("minecraft:fire_base", vec![3]),
        ]),
        (RegistryKind::Fluid, vec![
            ("minecraft:water", vec![2, 1]),
            ("minecraft:lava", vec![4, 3]),
        ]),
        (RegistryKind::EntityType, vec![
            ("minecraft:skeletons", vec![0, 1, 2]),
            ("minecraft:undead", vec![0, 1, 2, 3]),
        ]),
        (RegistryKind::GameEvent, vec![
            ("minecraft:vibrations", vec![0, 1, 2, 3]),
            ("minecraft:warden_can_listen", vec![0, 1]),
        ]),
        (RegistryKind::Material, vec![
            ("minecraft:planks", vec![5, 6, 7]),
            ("minecraft:logs", vec![8, 9, 10]),
        ]),
        (RegistryKind::DamageType, vec![
            ("minecraft:bypasses_armor", vec![6, 7, 17, 40]),
            ("minecraft:is_fire", vec![14, 20, 21, 31]),
        ]),
        (RegistryKind::Enchantment, vec![
            ("minecraft:curse", vec![2, 40]),
            ("minecraft:treasure", vec![2, 14, 22, 35, 37, 40]),
        ]),
    ]
}
